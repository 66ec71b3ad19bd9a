use crate::image::ImageTransforms;
use crate::Result;
use image::RgbImage;
use ndarray::Array4;

/// ImageNet归一化均值 (RGB)
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet归一化标准差 (RGB)
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// 短边缩放尺寸
pub const RESIZE_SIZE: u32 = 256;
/// 中心裁剪尺寸，即模型输入的高和宽
pub const CROP_SIZE: u32 = 224;

pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// 模型输入形状 (N, C, H, W)
    pub fn input_shape() -> [usize; 4] {
        [1, 3, CROP_SIZE as usize, CROP_SIZE as usize]
    }

    /// 验证集预处理流水线：短边缩放 -> 中心裁剪 -> 归一化
    pub fn preprocess(image: &RgbImage) -> Result<Array4<f32>> {
        let resized = ImageTransforms::resize_shorter_side(image, RESIZE_SIZE)?;
        let cropped = ImageTransforms::center_crop(&resized, CROP_SIZE, CROP_SIZE)?;

        Ok(Self::to_normalized_tensor(&cropped))
    }

    /// 转换为NCHW张量，像素缩放到[0,1]后按通道归一化
    pub fn to_normalized_tensor(image: &RgbImage) -> Array4<f32> {
        let (width, height) = image.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

        for (x, y, pixel) in image.enumerate_pixels() {
            for c in 0..3 {
                let value = f32::from(pixel[c]) / 255.0;
                tensor[[0, c, y as usize, x as usize]] = (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            }
        }

        tensor
    }
}
