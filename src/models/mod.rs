pub mod backbone;
pub mod labels;
pub mod manager;

pub use backbone::{Backbone, BackboneInfo, OnnxBackbone};
pub use labels::{class_name, CLASS_NAMES, NUM_CLASSES};
pub use manager::{ModelManager, ModelStats};
