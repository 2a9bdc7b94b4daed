use crate::constants::{ROUTES_API_BASE_URL, ROUTES_API_FIELD_MASK};
use crate::error::{AppError, Result};
use crate::models::{RouteComputationRequest, RouteResult};
use async_trait::async_trait;
use reqwest::Client;

/// Anything that can turn a computation request into routes. The HTTP
/// client below is the production implementation; tests swap in fakes.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn compute_routes(&self, request: &RouteComputationRequest) -> Result<RouteResult>;
}

#[derive(Clone)]
pub struct RoutesApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl RoutesApiClient {
    pub fn new(api_key: String) -> Self {
        RoutesApiClient {
            client: Client::new(),
            api_key,
            base_url: ROUTES_API_BASE_URL.to_string(),
        }
    }

    pub fn with_config(api_key: String, base_url: String) -> Self {
        RoutesApiClient {
            client: Client::new(),
            api_key,
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl RouteProvider for RoutesApiClient {
    /// Single-shot `computeRoutes` call. Non-2xx responses become
    /// `Routes API error: <status> <reason>. <body>`; there is no retry.
    async fn compute_routes(&self, request: &RouteComputationRequest) -> Result<RouteResult> {
        tracing::debug!(
            intermediates = request.intermediates.len(),
            mode = %request.travel_mode,
            optimize = request.optimize_waypoint_order,
            "Routes API request: {} intermediates, mode {}",
            request.intermediates.len(), request.travel_mode
        );

        let response = self
            .client
            .post(&self.base_url)
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", ROUTES_API_FIELD_MASK)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::RoutesApi(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            // Echo JSON error bodies compactly; anything else becomes `{}`
            let error_body = serde_json::from_str::<serde_json::Value>(&error_text)
                .map(|v| v.to_string())
                .unwrap_or_else(|_| "{}".to_string());
            tracing::warn!(
                status = %status,
                "Routes API HTTP error {}: {}",
                status, error_body
            );
            return Err(AppError::RoutesApi(format!(
                "{} {}. {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
                error_body
            )));
        }

        let result: RouteResult = response
            .json()
            .await
            .map_err(|e| AppError::RoutesApi(format!("Failed to parse response: {}", e)))?;

        match result.primary() {
            Some(route) => tracing::debug!(
                distance_m = route.distance_meters,
                duration = %route.duration,
                legs = route.legs.len(),
                "Routes API response: {}m, {}, {} legs",
                route.distance_meters, route.duration, route.legs.len()
            ),
            None => tracing::warn!("Routes API returned no routes"),
        }

        Ok(result)
    }
}
