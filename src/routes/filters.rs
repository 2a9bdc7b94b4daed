use crate::error::{AppError, Result};
use crate::models::WasteCategory;
use crate::planning::{DistanceBucket, FilterCriteria, QueryState};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Filter menu state as the client sends it. Empty strings mean "unset".
#[derive(Debug, Default, Deserialize)]
pub struct FilterSelection {
    #[serde(default)]
    pub classes: Vec<String>,
    pub distance: Option<String>,
    pub status: Option<String>,
    pub month: Option<u8>,
    pub year: Option<i32>,
}

impl FilterSelection {
    /// Unlike query parsing, invalid values here are rejected.
    pub fn into_criteria(self) -> Result<FilterCriteria> {
        let classes: BTreeSet<WasteCategory> = self
            .classes
            .iter()
            .map(|c| c.parse::<WasteCategory>())
            .collect::<std::result::Result<_, String>>()
            .map_err(AppError::InvalidRequest)?;

        let distance = self
            .distance
            .filter(|d| !d.trim().is_empty())
            .map(|d| d.parse::<DistanceBucket>())
            .transpose()
            .map_err(AppError::InvalidRequest)?;

        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err(AppError::InvalidRequest(format!(
                    "Invalid month: {} (must be between 1 and 12)",
                    month
                )));
            }
        }

        // "all" and blank both clear the status filter
        let status = self
            .status
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && s != crate::planning::filters::ALL_STATUSES);

        Ok(FilterCriteria {
            classes,
            distance,
            status,
            month: self.month,
            year: self.year,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ApplyFiltersRequest {
    #[serde(default)]
    pub query: String,
    pub filters: FilterSelection,
}

#[derive(Debug, Serialize)]
pub struct ApplyFiltersResponse {
    pub query: String,
    pub filters: FilterCriteria,
}

/// POST /filters
/// Writes a filter selection into a query string. The page number is
/// reset; selection and mode parameters are kept.
pub async fn apply_filter_selection(
    Json(request): Json<ApplyFiltersRequest>,
) -> Result<Json<ApplyFiltersResponse>> {
    let criteria = request.filters.into_criteria()?;
    let mut query = QueryState::parse(&request.query);
    criteria.write_to(&mut query);

    Ok(Json(ApplyFiltersResponse {
        query: query.encode(),
        filters: criteria,
    }))
}
