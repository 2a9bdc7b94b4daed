use crate::error::{AppError, Result};
use crate::models::Detection;
use crate::planning::filters::DISTANCE_BUCKETS;
use crate::planning::{
    apply_filters, derive_facets, paginate, DistanceBucket, Facets, FilterCriteria, Page,
    QueryState,
};
use crate::routes::extract::DeviceLocation;
use crate::AppState;
use axum::extract::{Path, RawQuery, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct HistoryView {
    /// Canonical query; differs from the request when the page was clamped
    pub query: String,
    pub filters: FilterCriteria,
    pub facets: Facets,
    pub distance_buckets: Vec<DistanceBucket>,
    pub page: Page<Detection>,
}

/// GET /history/{collector_id}
/// A collector's activity, filtered by the query and paginated.
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(collector_id): Path<String>,
    DeviceLocation(position): DeviceLocation,
    RawQuery(query): RawQuery,
) -> Result<Json<HistoryView>> {
    let query = QueryState::parse(query.as_deref().unwrap_or_default());
    let criteria = FilterCriteria::from_query(&query);
    if criteria.requires_position() && position.is_none() {
        return Err(AppError::LocationUnavailable(
            "Device location is required to filter by distance".to_string(),
        ));
    }

    let activity = state.backend.collector_activity(&collector_id).await?;
    let filtered = apply_filters(&activity, &criteria, position.as_ref());
    let page = paginate(&filtered, &query, state.settings.history_page_size);

    tracing::debug!(
        collector_id = %collector_id,
        total = activity.len(),
        matching = filtered.len(),
        page = page.page,
        "History for {}: {} of {} records match, page {}/{}",
        collector_id, filtered.len(), activity.len(), page.page, page.total_pages
    );

    Ok(Json(HistoryView {
        query: page.corrected_query.clone().unwrap_or_else(|| query.encode()),
        filters: criteria,
        facets: derive_facets(&activity),
        distance_buckets: DISTANCE_BUCKETS.to_vec(),
        page,
    }))
}
