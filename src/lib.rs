// Library exports for testing and reusability

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod planning;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use error::{AppError, Result};

use config::Config;
use services::{DetectionsBackend, Geocoder, PlanningSessions};
use std::sync::Arc;

/// View knobs read from configuration
#[derive(Debug, Clone)]
pub struct ViewSettings {
    /// Status whose detections the map shows
    pub map_detection_status: String,
    pub history_page_size: usize,
}

impl ViewSettings {
    pub fn from_config(config: &Config) -> Self {
        ViewSettings {
            map_detection_status: config.map_detection_status.clone(),
            history_page_size: config.history_page_size,
        }
    }
}

// App state for sharing across the application
pub struct AppState {
    pub backend: Arc<dyn DetectionsBackend>,
    pub sessions: PlanningSessions,
    pub geocoder: Geocoder,
    pub settings: ViewSettings,
}
