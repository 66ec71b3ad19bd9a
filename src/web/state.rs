//! Application state shared by all handlers.

use std::sync::Arc;
use std::time::Instant;

use crate::{models::ModelManager, Config};

/// Shared application state
pub struct AppState {
    /// Server configuration
    pub config: Config,
    /// The loaded classifier, read-only after startup
    pub models: ModelManager,
    /// Server start time
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, models: ModelManager) -> Self {
        Self {
            config,
            models,
            started_at: Instant::now(),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

pub type SharedState = Arc<AppState>;
