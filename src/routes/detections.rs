use crate::error::{AppError, Result};
use crate::models::{PixelContour, Waypoint};
use crate::routes::extract::DeviceLocation;
use crate::services::DetectionOutcome;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct MarkDetectionRequest {
    pub collector_user_id: String,
    /// Overrides the location header when present
    #[serde(default)]
    pub position: Option<Waypoint>,
}

async fn mark(
    state: &AppState,
    detection_id: &str,
    outcome: DetectionOutcome,
    location: DeviceLocation,
    request: MarkDetectionRequest,
) -> Result<Response> {
    if request.collector_user_id.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "collector_user_id is required".to_string(),
        ));
    }

    // Collection is confirmed on site, so a position fix is mandatory
    let position = match request.position {
        Some(p) => Waypoint::new(p.lat, p.lng).map_err(AppError::InvalidRequest)?,
        None => location.require("confirm a detection")?,
    };

    tracing::info!(
        detection_id = %detection_id,
        lat = position.lat,
        lng = position.lng,
        "Collector {} reports {} at ({:.4}, {:.4})",
        request.collector_user_id, outcome.path_segment(), position.lat, position.lng
    );

    let reply = state
        .backend
        .mark_detection(detection_id, outcome, &request.collector_user_id)
        .await?;

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok((status, Json(reply.body)).into_response())
}

/// POST /detections/{id}/collect
pub async fn collect_detection(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    location: DeviceLocation,
    Json(request): Json<MarkDetectionRequest>,
) -> Result<Response> {
    mark(&state, &id, DetectionOutcome::Collect, location, request).await
}

/// POST /detections/{id}/not_found
pub async fn report_not_found(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    location: DeviceLocation,
    Json(request): Json<MarkDetectionRequest>,
) -> Result<Response> {
    mark(&state, &id, DetectionOutcome::NotFound, location, request).await
}

/// Largest photo side accepted for overlay scaling
const MAX_OVERLAY_SIDE_PX: f64 = 10_000.0;

#[derive(Debug, Deserialize)]
pub struct OverlayParams {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Serialize)]
pub struct OverlayResponse {
    pub id: String,
    pub width: f64,
    pub height: f64,
    pub contours: Vec<PixelContour>,
}

/// GET /detections/{id}/overlay?width=&height=
/// Detection contours scaled to the photo as rendered by the client. The
/// backend has no single-detection endpoint, so the id is looked up among
/// the map detections.
pub async fn get_overlay(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<OverlayParams>,
) -> Result<Json<OverlayResponse>> {
    for (name, value) in [("width", params.width), ("height", params.height)] {
        if !value.is_finite() || value <= 0.0 || value > MAX_OVERLAY_SIDE_PX {
            return Err(AppError::InvalidRequest(format!(
                "Invalid {}: {} (must be between 0 and {})",
                name, value, MAX_OVERLAY_SIDE_PX
            )));
        }
    }

    let detections = state
        .backend
        .detections_by_status(&state.settings.map_detection_status)
        .await?;
    let detection = detections
        .iter()
        .find(|d| d.id == id)
        .ok_or_else(|| AppError::NotFound(format!("Detection {} is not on the map", id)))?;

    let contours = detection
        .geometry
        .as_ref()
        .map(|g| g.overlay_contours())
        .unwrap_or_default()
        .iter()
        .map(|c| c.to_pixel_contour(params.width, params.height))
        .collect();

    Ok(Json(OverlayResponse {
        id,
        width: params.width,
        height: params.height,
        contours,
    }))
}
