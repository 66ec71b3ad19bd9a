use crate::utils::error::ClassifierError;
use crate::Result;
use image::{imageops, imageops::FilterType, RgbImage};

/// 缩放后长边的上限，超出的细长图像直接拒绝
pub const MAX_RESIZED_LONG_SIDE: u32 = 16 * 1024;

/// 图像变换工具集
pub struct ImageTransforms;

impl ImageTransforms {
    /// 按短边缩放到目标尺寸，长边等比例缩放（向下取整）
    pub fn resize_shorter_side(image: &RgbImage, size: u32) -> Result<RgbImage> {
        let (width, height) = image.dimensions();
        let (new_w, new_h) = Self::shorter_side_dims(width, height, size)?;

        if (new_w, new_h) == (width, height) {
            return Ok(image.clone());
        }

        Ok(imageops::resize(image, new_w, new_h, FilterType::Triangle))
    }

    /// 计算短边缩放后的输出尺寸
    pub fn shorter_side_dims(width: u32, height: u32, size: u32) -> Result<(u32, u32)> {
        if width == 0 || height == 0 || size == 0 {
            return Err(ClassifierError::ImageProcessing(format!(
                "Cannot resize {}x{} image to shorter side {}",
                width, height, size
            )));
        }

        let (short, long) = if width <= height {
            (width, height)
        } else {
            (height, width)
        };
        if short == size {
            return Ok((width, height));
        }

        let new_long = u32::try_from(u64::from(size) * u64::from(long) / u64::from(short))
            .ok()
            .filter(|&new_long| new_long <= MAX_RESIZED_LONG_SIDE)
            .ok_or_else(|| {
                ClassifierError::ImageProcessing(format!(
                    "Aspect ratio of {}x{} image is too extreme to resize (long side limit {})",
                    width, height, MAX_RESIZED_LONG_SIDE
                ))
            })?;

        Ok(if width <= height {
            (size, new_long)
        } else {
            (new_long, size)
        })
    }

    /// 中心裁剪
    pub fn center_crop(image: &RgbImage, crop_width: u32, crop_height: u32) -> Result<RgbImage> {
        let (width, height) = image.dimensions();

        if crop_width > width || crop_height > height {
            return Err(ClassifierError::ImageProcessing(format!(
                "Crop {}x{} exceeds image {}x{}",
                crop_width, crop_height, width, height
            )));
        }

        let (left, top) = Self::center_crop_offset(width, height, crop_width, crop_height);

        Ok(imageops::crop_imm(image, left, top, crop_width, crop_height).to_image())
    }

    /// 裁剪起点，偏移量的 .5 向偶数舍入
    pub fn center_crop_offset(
        width: u32,
        height: u32,
        crop_width: u32,
        crop_height: u32,
    ) -> (u32, u32) {
        let left = (f64::from(width - crop_width) / 2.0).round_ties_even() as u32;
        let top = (f64::from(height - crop_height) / 2.0).round_ties_even() as u32;
        (left, top)
    }
}
