use crate::utils::error::ClassifierError;
use crate::{Config, Result};
use ndarray::{Array2, Array4, Ix2};
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// 分类主干网络：NCHW输入张量 -> 每个类别的logits
pub trait Backbone: Send + Sync {
    /// 前向推理，输入 [1, 3, H, W]，输出 [1, num_classes]
    fn forward(&self, input: Array4<f32>) -> Result<Array2<f32>>;

    /// 模型描述信息
    fn describe(&self) -> BackboneInfo;
}

#[derive(Debug, Clone, Serialize)]
pub struct BackboneInfo {
    pub runtime: String,
    pub source: String,
    pub input_name: String,
    pub output_name: String,
}

/// 基于ONNX Runtime的ResNet-50分类器
pub struct OnnxBackbone {
    session: Arc<Mutex<Session>>,
    source: String,
    input_name: String,  // 动态发现的输入名称
    output_name: String, // 动态发现的输出名称
}

impl OnnxBackbone {
    pub fn new(config: &Config) -> Result<Self> {
        let model_path = &config.model_path;

        if !model_path.exists() {
            return Err(ClassifierError::ModelLoad(format!(
                "Checkpoint not found: {}",
                model_path.display()
            )));
        }

        tracing::info!("Loading classification model from: {}", model_path.display());

        let session = Session::builder()
            .map_err(|e| load_error(model_path, e))?
            .with_optimization_level(optimization_level(config.onnx_config.optimization_level))
            .map_err(|e| load_error(model_path, e))?
            .with_intra_threads(config.onnx_config.intra_threads)
            .map_err(|e| load_error(model_path, e))?
            .commit_from_file(model_path)
            .map_err(|e| load_error(model_path, e))?;

        let input_name = match session.inputs.first() {
            Some(input) => input.name.clone(),
            None => {
                return Err(ClassifierError::ModelLoad(
                    "Classification model has no inputs".to_string(),
                ))
            }
        };

        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(ClassifierError::ModelLoad(
                    "Classification model has no outputs".to_string(),
                ))
            }
        };

        tracing::info!(
            "Classification model input: '{}', output: '{}'",
            input_name,
            output_name
        );
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Classification output[{}]: '{}'", i, output.name);
        }

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            source: model_path.display().to_string(),
            input_name,
            output_name,
        })
    }
}

impl Backbone for OnnxBackbone {
    fn forward(&self, input: Array4<f32>) -> Result<Array2<f32>> {
        let input_tensor = Tensor::from_array(input)?;

        let mut session = self.session.lock();
        let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            ClassifierError::Inference(format!(
                "Classification output '{}' not found",
                self.output_name
            ))
        })?;
        let logits = output.try_extract_array::<f32>()?.into_owned();

        logits.into_dimensionality::<Ix2>().map_err(|e| {
            ClassifierError::Inference(format!("Expected 2D logits tensor: {}", e))
        })
    }

    fn describe(&self) -> BackboneInfo {
        BackboneInfo {
            runtime: "onnxruntime".to_string(),
            source: self.source.clone(),
            input_name: self.input_name.clone(),
            output_name: self.output_name.clone(),
        }
    }
}

fn load_error(path: &Path, e: impl std::fmt::Display) -> ClassifierError {
    ClassifierError::ModelLoad(format!("Failed to open checkpoint {}: {}", path.display(), e))
}

fn optimization_level(level: i32) -> GraphOptimizationLevel {
    match level {
        i32::MIN..=0 => GraphOptimizationLevel::Disable,
        1 => GraphOptimizationLevel::Level1,
        2 => GraphOptimizationLevel::Level2,
        _ => GraphOptimizationLevel::Level3,
    }
}
