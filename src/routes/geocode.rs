use crate::error::{AppError, Result};
use crate::models::Waypoint;
use crate::AppState;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ReverseGeocodeParams {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize)]
pub struct ReverseGeocodeResponse {
    pub address: String,
}

/// GET /geocode/reverse?lat=..&lng=..
pub async fn reverse_geocode(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReverseGeocodeParams>,
) -> Result<Json<ReverseGeocodeResponse>> {
    let position = Waypoint::new(params.lat, params.lng).map_err(AppError::InvalidRequest)?;
    let address = state.geocoder.reverse(position).await;
    Ok(Json(ReverseGeocodeResponse { address }))
}
