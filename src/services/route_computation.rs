use crate::error::{AppError, Result};
use crate::models::{RouteResult, Waypoint};
use crate::planning::RouteRequestBuilder;
use crate::services::routes_api::RouteProvider;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const NO_WAYPOINTS_SELECTED: &str = "No waypoints selected";

#[derive(Debug, Default)]
struct RouteState {
    route_data: Option<RouteResult>,
    /// Calls currently awaiting the provider
    in_flight: usize,
    error: Option<String>,
}

/// Observable state of a planning session's route computation.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RouteSnapshot {
    pub route_data: Option<RouteResult>,
    pub is_calculating: bool,
    pub error: Option<String>,
}

/// Route computation for one planning session.
///
/// Overlapping calls are not sequenced: each one writes its outcome when
/// it resolves, so the last response to arrive wins, even after `clear()`.
/// Starting a call discards the previous result.
/// The lock is never held across the provider call.
pub struct RouteComputation {
    provider: Arc<dyn RouteProvider>,
    builder: RouteRequestBuilder,
    state: RwLock<RouteState>,
}

impl RouteComputation {
    pub fn new(provider: Arc<dyn RouteProvider>, builder: RouteRequestBuilder) -> Self {
        RouteComputation {
            provider,
            builder,
            state: RwLock::new(RouteState::default()),
        }
    }

    pub async fn calculate_route(&self, origin: Waypoint, stops: &[Waypoint]) -> Result<RouteResult> {
        if stops.is_empty() {
            self.state.write().await.error = Some(NO_WAYPOINTS_SELECTED.to_string());
            return Err(AppError::InvalidRequest(NO_WAYPOINTS_SELECTED.to_string()));
        }

        let request = self.builder.build(origin, stops)?;

        {
            let mut state = self.state.write().await;
            state.in_flight += 1;
            state.route_data = None;
            state.error = None;
        }

        let outcome = self.provider.compute_routes(&request).await;

        let mut state = self.state.write().await;
        state.in_flight = state.in_flight.saturating_sub(1);
        match outcome {
            Ok(result) => {
                state.route_data = Some(result.clone());
                state.error = None;
                Ok(result)
            }
            Err(e) => {
                tracing::warn!(stops = stops.len(), "Route calculation failed: {}", e);
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Discards the last result and error. In-flight calls are not
    /// cancelled.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.route_data = None;
        state.error = None;
    }

    pub async fn snapshot(&self) -> RouteSnapshot {
        let state = self.state.read().await;
        RouteSnapshot {
            route_data: state.route_data.clone(),
            is_calculating: state.in_flight > 0,
            error: state.error.clone(),
        }
    }

    pub async fn is_calculating(&self) -> bool {
        self.state.read().await.in_flight > 0
    }
}
