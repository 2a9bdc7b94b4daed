use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vetiver::config::Config;
use vetiver::planning::RouteRequestBuilder;
use vetiver::services::{
    DetectionsBackend, Geocoder, HttpDetectionsBackend, PlanningSessions, RouteProvider,
    RoutesApiClient,
};
use vetiver::{AppState, ViewSettings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vetiver=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| format!("Failed to load configuration: {}", e))?;

    tracing::info!("Starting Vetiver planning API server");
    tracing::info!(
        backend = %config.backend_url,
        travel_mode = %config.routing.travel_mode,
        "Configuration loaded successfully"
    );

    // Initialize services
    let backend: Arc<dyn DetectionsBackend> =
        Arc::new(HttpDetectionsBackend::new(config.backend_url.clone()));

    let routes_client = if let Some(ref base_url) = config.routes_api_base_url {
        tracing::info!("Using Routes API endpoint override: {}", base_url);
        RoutesApiClient::with_config(config.routes_api_key.clone(), base_url.clone())
    } else {
        RoutesApiClient::new(config.routes_api_key.clone())
    };
    let route_provider: Arc<dyn RouteProvider> = Arc::new(routes_client);

    let sessions = PlanningSessions::new(
        route_provider,
        RouteRequestBuilder::new(config.routing.clone()),
        config.session_ttl,
    );
    let geocoder = Geocoder::new(config.nominatim_base_url.clone(), config.geocode_cache_ttl);

    // Create application state
    let state = Arc::new(AppState {
        backend,
        sessions,
        geocoder,
        settings: ViewSettings::from_config(&config),
    });

    // Build router with CORS and tracing
    let app = Router::new()
        .nest("/api/v1", vetiver::routes::create_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
