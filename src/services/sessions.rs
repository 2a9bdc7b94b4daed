use crate::constants::MAX_PLANNING_SESSIONS;
use crate::planning::RouteRequestBuilder;
use crate::services::route_computation::RouteComputation;
use crate::services::routes_api::RouteProvider;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Route computation state per planning session, keyed by the client's
/// session id. Sessions idle for longer than the TTL are evicted.
pub struct PlanningSessions {
    sessions: Cache<String, Arc<RouteComputation>>,
    provider: Arc<dyn RouteProvider>,
    builder: RouteRequestBuilder,
}

impl PlanningSessions {
    pub fn new(
        provider: Arc<dyn RouteProvider>,
        builder: RouteRequestBuilder,
        idle_ttl_seconds: u64,
    ) -> Self {
        let sessions = Cache::builder()
            .time_to_idle(Duration::from_secs(idle_ttl_seconds))
            .max_capacity(MAX_PLANNING_SESSIONS)
            .build();

        PlanningSessions {
            sessions,
            provider,
            builder,
        }
    }

    /// Session state for `session_id`. Requests without an id get a
    /// throwaway computation that is not retained.
    pub async fn for_session(&self, session_id: Option<&str>) -> Arc<RouteComputation> {
        match session_id.filter(|id| !id.is_empty()) {
            Some(id) => {
                self.sessions
                    .get_with(id.to_string(), async { Arc::new(self.new_computation()) })
                    .await
            }
            None => Arc::new(self.new_computation()),
        }
    }

    /// Existing session state, without creating one
    pub async fn get(&self, session_id: &str) -> Option<Arc<RouteComputation>> {
        self.sessions.get(session_id).await
    }

    pub fn request_builder(&self) -> &RouteRequestBuilder {
        &self.builder
    }

    /// Approximate; moka applies evictions lazily.
    pub fn active_sessions(&self) -> u64 {
        self.sessions.entry_count()
    }

    fn new_computation(&self) -> RouteComputation {
        RouteComputation::new(self.provider.clone(), self.builder.clone())
    }
}
