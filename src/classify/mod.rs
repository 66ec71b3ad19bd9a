pub mod pipeline;
pub mod types;

pub use pipeline::ClassifierPipeline;
pub use types::{Prediction, PredictionResponse};
