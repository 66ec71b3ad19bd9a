use crate::{
    classify::{ClassifierPipeline, PredictionResponse},
    utils::error::ClassifierError,
    web::{extractors::RequestId, state::SharedState},
    Result,
};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    response::Json,
};
use serde_json::{json, Value};
use std::time::Instant;

/// 上传文件的表单字段名
pub const IMAGE_FIELD: &str = "image";

pub const INDEX_MESSAGE: &str = "Plant Disease Classifier API. Use POST /predict with an image.";

/// 首页信息
pub async fn index_handler() -> Json<Value> {
    Json(json!({ "message": INDEX_MESSAGE }))
}

/// Multipart图像上传分类处理器
pub async fn predict_handler(
    State(state): State<SharedState>,
    RequestId(request_id): RequestId,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictionResponse>> {
    let start_time = Instant::now();

    tracing::info!("Processing predict request: request_id={}", request_id);

    let image_data = match multipart {
        Ok(multipart) => read_image_field(multipart).await?,
        Err(rejection) => {
            tracing::debug!("Not a multipart request: {}", rejection);
            None
        }
    };

    let image_data = image_data
        .ok_or_else(|| ClassifierError::InvalidInput("No image file provided".to_string()))?;

    tracing::debug!("Received file: {} bytes", image_data.len());

    let prediction = ClassifierPipeline::process_bytes(&state.models, image_data).await?;
    let response = PredictionResponse::from(&prediction);

    tracing::info!(
        "Prediction completed: request_id={}, class={}, confidence={:.4}, time={:.3}s",
        request_id,
        response.predicted_class,
        response.confidence,
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(response))
}

/// 读取第一个 `image` 字段，其余字段忽略
async fn read_image_field(mut multipart: Multipart) -> Result<Option<Bytes>> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ClassifierError::InvalidInput(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or("unknown").to_string();

        if field_name != IMAGE_FIELD {
            tracing::debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        let data = field.bytes().await.map_err(|e| {
            ClassifierError::InvalidInput(format!("Failed to read file data: {}", e))
        })?;

        return Ok(Some(data));
    }

    Ok(None)
}

/// 健康检查端点
pub async fn health_handler(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.uptime_seconds(),
    }))
}

/// 服务信息端点
pub async fn info_handler(State(state): State<SharedState>) -> Json<Value> {
    let stats = state.models.get_stats();

    Json(json!({
        "service": "Plant Disease Classifier",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "model": stats,
        "intra_threads": state.config.onnx_config.intra_threads,
        "classes": &crate::models::CLASS_NAMES[..],
    }))
}
