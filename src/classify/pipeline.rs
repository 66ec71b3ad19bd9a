use crate::{
    classify::Prediction,
    image::{ImageLoader, ImagePreprocessor},
    models::{class_name, Backbone, ModelManager},
    utils::error::ClassifierError,
    Result,
};
use axum::body::Bytes;
use image::RgbImage;
use ndarray::ArrayView1;
use std::time::Instant;

/// 分类处理流水线
pub struct ClassifierPipeline;

impl ClassifierPipeline {
    /// 处理上传的图像字节，解码与推理在阻塞线程池中执行
    pub async fn process_bytes(models: &ModelManager, bytes: Bytes) -> Result<Prediction> {
        let backbone = models.backbone();

        tokio::task::spawn_blocking(move || {
            let image = ImageLoader::decode_rgb(&bytes)?;
            Self::classify_image(backbone.as_ref(), &image)
        })
        .await
        .map_err(|e| ClassifierError::Internal(format!("Inference task failed: {}", e)))?
    }

    /// 预处理 -> 前向推理 -> softmax -> argmax
    pub fn classify_image(backbone: &dyn Backbone, image: &RgbImage) -> Result<Prediction> {
        let start_time = Instant::now();
        let (width, height) = image.dimensions();

        let input = ImagePreprocessor::preprocess(image)?;
        let logits = backbone.forward(input)?;

        if logits.nrows() != 1 {
            return Err(ClassifierError::Inference(format!(
                "Expected batch size 1, got {}",
                logits.nrows()
            )));
        }

        if logits.iter().any(|v| !v.is_finite()) {
            return Err(ClassifierError::Inference(
                "Model produced non-finite logits".to_string(),
            ));
        }

        let probabilities = softmax(logits.row(0));
        let (class_index, confidence) = argmax(&probabilities)
            .ok_or_else(|| ClassifierError::Inference("Model produced no logits".to_string()))?;
        let label = class_name(class_index).ok_or_else(|| {
            ClassifierError::Inference(format!("Class index {} has no label", class_index))
        })?;

        tracing::debug!(
            "Classified {}x{} image as {} ({:.4}) in {:.3}ms",
            width,
            height,
            label,
            confidence,
            start_time.elapsed().as_secs_f64() * 1000.0
        );

        Ok(Prediction {
            class_index,
            label,
            confidence,
            probabilities,
        })
    }
}

/// 数值稳定的softmax
pub fn softmax(logits: ArrayView1<f32>) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();

    exps.into_iter().map(|e| e / sum).collect()
}

/// 最大值所在索引，相等时取第一个
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;

    for (i, &value) in values.iter().enumerate() {
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((i, value)),
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BackboneInfo, NUM_CLASSES};
    use image::Rgb;
    use ndarray::{arr1, Array2, Array4};

    /// 对每个类别输出 (类别索引 * 输入均值) 的确定性模型
    struct MeanScaled;

    impl Backbone for MeanScaled {
        fn forward(&self, input: Array4<f32>) -> Result<Array2<f32>> {
            let mean = input.mean().unwrap_or(0.0);
            Ok(Array2::from_shape_fn((1, NUM_CLASSES), |(_, j)| {
                j as f32 * mean
            }))
        }

        fn describe(&self) -> BackboneInfo {
            BackboneInfo {
                runtime: "test".to_string(),
                source: "mean-scaled".to_string(),
                input_name: "input".to_string(),
                output_name: "logits".to_string(),
            }
        }
    }

    /// 输出NaN的模型
    struct NanLogits;

    impl Backbone for NanLogits {
        fn forward(&self, _input: Array4<f32>) -> Result<Array2<f32>> {
            let mut logits = Array2::zeros((1, NUM_CLASSES));
            logits[[0, 3]] = f32::NAN;
            logits[[0, 7]] = f32::INFINITY;
            Ok(logits)
        }

        fn describe(&self) -> BackboneInfo {
            BackboneInfo {
                runtime: "test".to_string(),
                source: "nan".to_string(),
                input_name: "input".to_string(),
                output_name: "logits".to_string(),
            }
        }
    }

    #[test]
    fn non_finite_logits_are_an_inference_error() {
        let image = RgbImage::new(224, 224);
        let err = ClassifierPipeline::classify_image(&NanLogits, &image).unwrap_err();
        assert!(matches!(err, ClassifierError::Inference(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn softmax_sums_to_one() {
        let probs = softmax(arr1(&[1.0, 2.0, 3.0, -4.0]).view());
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn softmax_is_stable_for_large_logits() {
        let probs = softmax(arr1(&[1000.0, 1000.0, 999.0]).view());
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!((probs[0] - probs[1]).abs() < 1e-7);
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.1, 0.4, 0.4, 0.1]), Some((1, 0.4)));
        assert_eq!(argmax(&[0.25; 4]), Some((0, 0.25)));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn black_image_is_classified_deterministically() {
        // 全黑图像归一化后均值为负，索引0的logit最大
        let image = RgbImage::new(400, 300);
        let first = ClassifierPipeline::classify_image(&MeanScaled, &image).unwrap();
        let second = ClassifierPipeline::classify_image(&MeanScaled, &image).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.class_index, 0);
        assert_eq!(first.label, "Apple___Apple_scab");
        assert_eq!(first.probabilities.len(), NUM_CLASSES);
        let sum: f32 = first.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn bright_image_picks_last_class() {
        let image = RgbImage::from_pixel(64, 48, Rgb([255, 255, 255]));
        let prediction = ClassifierPipeline::classify_image(&MeanScaled, &image).unwrap();
        assert_eq!(prediction.class_index, NUM_CLASSES - 1);
        assert_eq!(prediction.label, "Tomato___healthy");
        assert!(prediction.confidence > 0.0 && prediction.confidence <= 1.0);
    }
}
