use crate::error::{AppError, Result};
use crate::models::route::path_feature;
use crate::models::{ClassCount, Detection, OverlayContour, RouteSummary, Waypoint};
use crate::planning::filters::DISTANCE_BUCKETS;
use crate::planning::{
    apply_filters, derive_facets, polyline, DistanceBucket, Facets, FilterCriteria, MapOrigin,
    ModeAction, PlanningMode, PlanningState,
};
use crate::routes::extract::{DeviceLocation, SessionId};
use crate::services::RouteSnapshot;
use crate::AppState;
use axum::extract::{RawQuery, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct MapMarker {
    pub id: String,
    pub position: Waypoint,
    pub photo: String,
    pub classes: Vec<ClassCount>,
    /// Total waste items across classes
    pub total: u32,
    pub selected: bool,
    /// Whether the checkbox is interactive
    pub selectable: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub overlay: Vec<OverlayContour>,
}

impl MapMarker {
    fn new(detection: &Detection, selected: bool, selectable: bool) -> Self {
        MapMarker {
            id: detection.id.clone(),
            position: detection.position,
            photo: detection.photo.clone(),
            classes: detection.classes.clone(),
            total: detection.total_count(),
            selected,
            selectable,
            overlay: detection
                .geometry
                .as_ref()
                .map(|g| g.overlay_contours())
                .unwrap_or_default(),
        }
    }
}

/// Route panel contents while calculating.
#[derive(Debug, Serialize)]
pub struct RouteView {
    pub is_calculating: bool,
    pub error: Option<String>,
    pub summary: Option<RouteSummary>,
    /// GeoJSON LineString feature of the decoded polyline
    pub path: Option<geojson::Feature>,
    /// Visiting order chosen by the provider for the intermediate stops
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub optimized_order: Vec<usize>,
}

impl From<RouteSnapshot> for RouteView {
    fn from(snapshot: RouteSnapshot) -> Self {
        let route = snapshot.route_data.as_ref().and_then(|r| r.primary());
        let summary = route.map(RouteSummary::from_route);
        let path = route.map(|r| {
            let points = polyline::decode(&r.polyline.encoded_polyline);
            path_feature(&points, summary.as_ref())
        });

        RouteView {
            is_calculating: snapshot.is_calculating,
            error: snapshot.error,
            summary,
            path,
            optimized_order: route
                .map(|r| r.optimized_intermediate_waypoint_index.clone())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MapView {
    /// Canonical query string for the address bar
    pub query: String,
    pub mode: PlanningMode,
    /// Effective selection, in stop order
    pub selection: Vec<String>,
    pub markers: Vec<MapMarker>,
    pub filters: FilterCriteria,
    pub facets: Facets,
    pub distance_buckets: Vec<DistanceBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteView>,
    pub external_maps_url: Option<String>,
}

/// Detections on the map after filtering, plus the unfiltered set for
/// facet derivation.
struct MapData {
    all: Vec<Detection>,
    visible: Vec<Detection>,
}

async fn load_map_data(
    state: &AppState,
    planning: &PlanningState,
    position: Option<Waypoint>,
) -> Result<MapData> {
    let criteria = planning.filters();
    if criteria.requires_position() && position.is_none() {
        return Err(AppError::LocationUnavailable(
            "Device location is required to filter by distance".to_string(),
        ));
    }

    let all = state
        .backend
        .detections_by_status(&state.settings.map_detection_status)
        .await?;
    let visible = apply_filters(&all, &criteria, position.as_ref());
    Ok(MapData { all, visible })
}

/// Positions of the selected detections that are still visible, in
/// selection order.
fn selected_stops(planning: &PlanningState, visible: &[Detection]) -> Vec<Waypoint> {
    planning
        .selection()
        .resolve(visible)
        .into_iter()
        .map(|d| d.position)
        .collect()
}

/// GET /map
/// Map view for the current query: markers, facets, selection and, when
/// calculating, the route panel.
pub async fn get_map(
    State(state): State<Arc<AppState>>,
    DeviceLocation(position): DeviceLocation,
    session: SessionId,
    RawQuery(query): RawQuery,
) -> Result<Json<MapView>> {
    let planning = PlanningState::from_query(query.as_deref().unwrap_or_default());
    let data = load_map_data(&state, &planning, position).await?;

    let mode = planning.mode();
    let effective = planning.selection().effective(&data.visible);
    let markers = data
        .visible
        .iter()
        .map(|d| MapMarker::new(d, effective.contains(&d.id), mode.allows_selection_changes()))
        .collect();

    let route = if mode == PlanningMode::Calculating {
        let computation = state.sessions.for_session(session.as_deref()).await;
        Some(RouteView::from(computation.snapshot().await))
    } else {
        None
    };

    let stops = selected_stops(&planning, &data.visible);
    let external_maps_url = state
        .sessions
        .request_builder()
        .build_external_map_url(MapOrigin::from(position), &stops);

    tracing::debug!(
        mode = %mode,
        visible = data.visible.len(),
        selected = effective.len(),
        "Map view: {} of {} detections visible, {} selected",
        data.visible.len(), data.all.len(), effective.len()
    );

    Ok(Json(MapView {
        query: planning.encode(),
        mode,
        selection: effective.iter().map(str::to_string).collect(),
        markers,
        filters: planning.filters(),
        facets: derive_facets(&data.all),
        distance_buckets: DISTANCE_BUCKETS.to_vec(),
        route,
        external_maps_url,
    }))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapAction {
    PlanRoute,
    CalculateRoute,
    Cancel,
    ToggleMarker { id: String, selected: bool },
}

#[derive(Debug, Deserialize)]
pub struct MapActionRequest {
    #[serde(default)]
    pub query: String,
    pub action: MapAction,
}

#[derive(Debug, Serialize)]
pub struct MapActionResponse {
    pub query: String,
    pub mode: PlanningMode,
    pub selection: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteView>,
}

/// POST /map/actions
/// Applies one user action to a query string and returns the new one.
pub async fn apply_action(
    State(state): State<Arc<AppState>>,
    DeviceLocation(position): DeviceLocation,
    session: SessionId,
    Json(request): Json<MapActionRequest>,
) -> Result<Json<MapActionResponse>> {
    let mut planning = PlanningState::from_query(&request.query);
    let mut route = None;

    match request.action {
        MapAction::PlanRoute => {
            planning.transition(ModeAction::PlanRoute)?;
        }
        MapAction::Cancel => {
            planning.transition(ModeAction::Cancel)?;
            if let Some(id) = session.as_deref() {
                if let Some(computation) = state.sessions.get(id).await {
                    computation.clear().await;
                }
            }
        }
        MapAction::ToggleMarker { id, selected } => {
            planning.toggle_marker(&id, selected)?;
        }
        MapAction::CalculateRoute => {
            // Validate the transition before any network work
            planning.mode().transition(ModeAction::CalculateRoute)?;
            let origin = DeviceLocation(position).require("calculate a route")?;

            let data = load_map_data(&state, &planning, position).await?;
            let stops = selected_stops(&planning, &data.visible);
            if stops.is_empty() {
                return Err(AppError::InvalidRequest(
                    crate::services::route_computation::NO_WAYPOINTS_SELECTED.to_string(),
                ));
            }

            planning.transition(ModeAction::CalculateRoute)?;

            let computation = state.sessions.for_session(session.as_deref()).await;
            tracing::info!(
                stops = stops.len(),
                "Calculating route from ({:.4}, {:.4}) through {} stops",
                origin.lat, origin.lng, stops.len()
            );
            match computation.calculate_route(origin, &stops).await {
                Ok(_) => {}
                // Provider failures are reported in the route panel
                Err(AppError::InvalidRequest(message)) => {
                    return Err(AppError::InvalidRequest(message))
                }
                Err(e) => tracing::warn!("Route calculation error kept in session: {}", e),
            }
            route = Some(RouteView::from(computation.snapshot().await));
        }
    }

    Ok(Json(MapActionResponse {
        query: planning.encode(),
        mode: planning.mode(),
        selection: planning.selection().iter().map(str::to_string).collect(),
        route,
    }))
}

#[derive(Debug, Serialize)]
pub struct ExternalUrlResponse {
    pub url: Option<String>,
}

/// GET /map/external-url
/// Consumer maps directions link for the current selection.
pub async fn get_external_url(
    State(state): State<Arc<AppState>>,
    DeviceLocation(position): DeviceLocation,
    RawQuery(query): RawQuery,
) -> Result<Json<ExternalUrlResponse>> {
    let planning = PlanningState::from_query(query.as_deref().unwrap_or_default());
    let data = load_map_data(&state, &planning, position).await?;
    let stops = selected_stops(&planning, &data.visible);

    let url = state
        .sessions
        .request_builder()
        .build_external_map_url(MapOrigin::from(position), &stops);

    Ok(Json(ExternalUrlResponse { url }))
}
