use crate::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// GET /debug/health - Liveness plus in-memory session count
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "checks": {
            "planning_sessions": state.sessions.active_sessions(),
            "map_detection_status": state.settings.map_detection_status,
        }
    }))
}
