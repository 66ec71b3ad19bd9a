use serde::{Deserialize, Serialize};

/// 单张图像的分类结果
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// 预测类别索引
    pub class_index: usize,
    /// 预测类别名称
    pub label: &'static str,
    /// 预测类别的概率
    pub confidence: f32,
    /// 所有类别的softmax概率
    pub probabilities: Vec<f32>,
}

/// `/predict` 的响应格式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predicted_class: String,
    pub confidence: f64,
}

impl From<&Prediction> for PredictionResponse {
    fn from(prediction: &Prediction) -> Self {
        Self {
            predicted_class: prediction.label.to_string(),
            confidence: round_to(f64::from(prediction.confidence), 4),
        }
    }
}

/// 四舍五入到指定小数位
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_rounded_to_four_places() {
        let prediction = Prediction {
            class_index: 3,
            label: "Apple___healthy",
            confidence: 0.987_654_3,
            probabilities: Vec::new(),
        };
        let response = PredictionResponse::from(&prediction);
        assert_eq!(response.predicted_class, "Apple___healthy");
        assert_eq!(response.confidence, 0.9877);
    }

    #[test]
    fn serializes_expected_keys() {
        let response = PredictionResponse {
            predicted_class: "Tomato___healthy".to_string(),
            confidence: 0.5,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["predicted_class"], "Tomato___healthy");
        assert_eq!(json["confidence"], 0.5);
    }
}
