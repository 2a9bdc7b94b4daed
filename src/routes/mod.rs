pub mod debug;
pub mod detections;
pub mod extract;
pub mod filters;
pub mod geocode;
pub mod history;
pub mod map;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/map", get(map::get_map))
        .route("/map/actions", post(map::apply_action))
        .route("/map/external-url", get(map::get_external_url))
        .route("/filters", post(filters::apply_filter_selection))
        .route("/history/{collector_id}", get(history::get_history))
        .route("/detections/{id}/collect", post(detections::collect_detection))
        .route("/detections/{id}/not_found", post(detections::report_not_found))
        .route("/detections/{id}/overlay", get(detections::get_overlay))
        .route("/geocode/reverse", get(geocode::reverse_geocode))
        .route("/debug/health", get(debug::health_check))
        .with_state(state)
}
