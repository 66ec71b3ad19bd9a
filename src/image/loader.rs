use crate::utils::error::ClassifierError;
use crate::Result;
use axum::body::Bytes;
use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};

pub struct ImageLoader;

impl ImageLoader {
    /// 从字节流加载图像
    pub fn from_bytes(bytes: &Bytes) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(ClassifierError::InvalidInput("Empty image file".to_string()));
        }

        if let Some(format) = Self::detect_format(bytes) {
            tracing::debug!("Detected image format: {:?}", format);
        }

        let image = image::load_from_memory(bytes)?;

        Ok(image)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 转换为RGB（丢弃alpha通道，灰度图扩展为三通道）
    pub fn to_rgb(image: &DynamicImage) -> Result<RgbImage> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ClassifierError::ImageProcessing(format!(
                "Image has zero area: {}x{}",
                width, height
            )));
        }

        Ok(image.to_rgb8())
    }

    /// 解码上传的字节并转换为RGB
    pub fn decode_rgb(bytes: &Bytes) -> Result<RgbImage> {
        let image = Self::from_bytes(bytes)?;
        Self::to_rgb(&image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode_png(image: DynamicImage) -> Bytes {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();
        Bytes::from(buffer.into_inner())
    }

    #[test]
    fn drops_alpha_channel() {
        let rgba = RgbaImage::from_pixel(8, 6, Rgba([10, 20, 30, 0]));
        let rgb = ImageLoader::decode_rgb(&encode_png(DynamicImage::ImageRgba8(rgba))).unwrap();
        assert_eq!(rgb.dimensions(), (8, 6));
        assert_eq!(rgb.get_pixel(3, 3).0, [10, 20, 30]);
    }

    #[test]
    fn expands_grayscale() {
        let gray = GrayImage::from_pixel(5, 5, Luma([77]));
        let rgb = ImageLoader::decode_rgb(&encode_png(DynamicImage::ImageLuma8(gray))).unwrap();
        assert_eq!(rgb.get_pixel(0, 0).0, [77, 77, 77]);
    }

    #[test]
    fn detects_png() {
        let bytes = encode_png(DynamicImage::new_rgb8(2, 2));
        assert_eq!(ImageLoader::detect_format(&bytes), Some(ImageFormat::Png));
    }

    #[test]
    fn rejects_garbage_and_empty_input() {
        let garbage = ImageLoader::from_bytes(&Bytes::from_static(b"not an image"));
        assert!(matches!(garbage, Err(ClassifierError::ImageDecode(_))));

        let empty = ImageLoader::from_bytes(&Bytes::new());
        assert!(matches!(empty, Err(ClassifierError::InvalidInput(_))));
    }
}
