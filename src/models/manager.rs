use crate::image::ImagePreprocessor;
use crate::models::labels::NUM_CLASSES;
use crate::models::{Backbone, BackboneInfo, OnnxBackbone};
use crate::utils::error::ClassifierError;
use crate::{Config, Result};
use ndarray::Array4;
use std::sync::Arc;

/// 模型管理器，进程启动时加载一次，之后只读共享
pub struct ModelManager {
    backbone: Arc<dyn Backbone>,
    info: BackboneInfo,
}

impl ModelManager {
    /// 从配置的检查点加载ONNX模型
    pub fn load(config: &Config) -> Result<Self> {
        tracing::info!("Initializing model manager...");

        let backbone = OnnxBackbone::new(config)?;
        let manager = Self::with_backbone(Arc::new(backbone))?;

        tracing::info!("Model manager initialized successfully");
        Ok(manager)
    }

    /// 使用给定的主干网络构建管理器，并做一次探测推理校验输出维度
    pub fn with_backbone(backbone: Arc<dyn Backbone>) -> Result<Self> {
        let info = backbone.describe();

        let probe = Array4::<f32>::zeros(ImagePreprocessor::input_shape());
        let logits = backbone.forward(probe).map_err(|e| {
            ClassifierError::ModelLoad(format!("Probe inference failed: {}", e))
        })?;

        if logits.shape() != [1, NUM_CLASSES] {
            return Err(ClassifierError::ModelLoad(format!(
                "Model output shape {:?} does not match {} class labels",
                logits.shape(),
                NUM_CLASSES
            )));
        }

        tracing::info!(
            "Probe inference passed: source={}, output={:?}",
            info.source,
            logits.shape()
        );

        Ok(Self { backbone, info })
    }

    /// 获取主干网络引用
    pub fn backbone(&self) -> Arc<dyn Backbone> {
        Arc::clone(&self.backbone)
    }

    /// 获取模型统计信息
    pub fn get_stats(&self) -> ModelStats {
        ModelStats {
            backbone: self.info.clone(),
            input_shape: ImagePreprocessor::input_shape(),
            num_classes: NUM_CLASSES,
        }
    }
}

/// 模型统计信息
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelStats {
    pub backbone: BackboneInfo,
    pub input_shape: [usize; 4],
    pub num_classes: usize,
}
