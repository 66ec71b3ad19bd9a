pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod state;

use crate::utils::error::ClassifierError;
use crate::{models::ModelManager, Config, Result};
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

pub use state::{AppState, SharedState};

pub async fn serve(config: Config) -> Result<()> {
    // 启动时加载模型，失败则进程退出
    let models = ModelManager::load(&config)?;

    let addr = config.bind_addr;
    let state = Arc::new(AppState::new(config, models));
    let app = create_app(state);

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  POST /predict  - Multipart image upload (field: image)");
    tracing::info!("  GET  /         - Service message");
    tracing::info!("  GET  /health   - Health check");
    tracing::info!("  GET  /api/info - Service information");

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        ClassifierError::Internal(format!("Failed to bind to address {}: {}", addr, e))
    })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ClassifierError::Internal(format!("Server failed to start: {}", e)))?;

    Ok(())
}

pub fn create_app(state: SharedState) -> Router {
    let server_config = &state.config.server_config;
    let max_request_size = server_config.max_request_size;
    let request_timeout = Duration::from_secs(server_config.request_timeout);

    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/predict", post(handlers::predict_handler))
        .route("/health", get(handlers::health_handler))
        .route("/api/info", get(handlers::info_handler))
        // 由RequestBodyLimitLayer统一限制请求体大小
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_request_size))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(from_fn(middleware::request_logging))
        .layer(from_fn(middleware::request_id))
        .with_state(state)
}
