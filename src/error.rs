use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Routes API error: {0}")]
    RoutesApi(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Geocoding error: {0}")]
    Geocoding(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

// Convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::RoutesApi(ref e) => {
                tracing::error!("Routes API error: {}", e);
                (StatusCode::BAD_GATEWAY, "Routing service error")
            }
            AppError::Backend(ref e) => {
                tracing::error!("Backend error: {}", e);
                (StatusCode::BAD_GATEWAY, "Detections service error")
            }
            AppError::Geocoding(ref e) => {
                tracing::warn!("Geocoding error: {}", e);
                (StatusCode::BAD_GATEWAY, "Geocoding service error")
            }
            AppError::InvalidRequest(ref e) => (StatusCode::BAD_REQUEST, e.as_str()),
            AppError::LocationUnavailable(ref e) => {
                tracing::info!("Location unavailable: {}", e);
                (StatusCode::PRECONDITION_REQUIRED, e.as_str())
            }
            AppError::InvalidTransition(ref e) => (StatusCode::CONFLICT, e.as_str()),
            AppError::NotFound(ref e) => (StatusCode::NOT_FOUND, e.as_str()),
        };

        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("Unknown error"),
            "message": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
