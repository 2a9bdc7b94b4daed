//! Stable application-wide constants.
//!
//! Values here are wire-format facts, external endpoints, and default
//! fallbacks for env-var-based configuration. Request knobs for the Routes
//! API that benefit from runtime tuning live in
//! [`RoutingConfig`](crate::config::RoutingConfig) instead.

// --- Server defaults (used when HOST / PORT env vars are absent) ---

/// Default bind address for the HTTP server.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default port for the HTTP server.
pub const DEFAULT_PORT: &str = "3000";

// --- External endpoints ---

/// Routes API `computeRoutes` endpoint. Overridden by `ROUTES_API_BASE_URL`.
pub const ROUTES_API_BASE_URL: &str = "https://routes.googleapis.com/directions/v2:computeRoutes";
/// Field mask sent with every `computeRoutes` call. Only these fields come back.
pub const ROUTES_API_FIELD_MASK: &str = "routes.duration,routes.distanceMeters,\
routes.polyline.encodedPolyline,routes.legs.duration,routes.legs.distanceMeters,\
routes.legs.startLocation,routes.legs.endLocation,routes.description,\
routes.warnings,routes.optimizedIntermediateWaypointIndex";
/// Consumer maps "directions" deep link prefix.
pub const EXTERNAL_MAPS_DIR_URL: &str = "https://www.google.com/maps/dir";
/// Path segment used in the deep link when the device location is unknown.
pub const EXTERNAL_MAPS_CURRENT_LOCATION: &str = "Your+Location";
/// Nominatim reverse-geocoding endpoint. Overridden by `NOMINATIM_BASE_URL`.
pub const NOMINATIM_REVERSE_URL: &str = "https://nominatim.openstreetmap.org/reverse";
/// User agent sent to Nominatim, which rejects anonymous clients.
pub const GEOCODER_USER_AGENT: &str = "VetiverApp/1.0";

// --- Geometry ---

/// Mean Earth radius used by every haversine distance in the crate.
pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Encoded polyline precision (5 decimal places).
pub const POLYLINE_PRECISION: f64 = 1e5;

// --- Detection data ---

/// Placeholder image used when a detection carries no photo.
pub const PHOTO_PLACEHOLDER: &str = "/foto_example.png";
/// Status whose detections are shown on the map. Overridden by `MAP_DETECTION_STATUS`.
pub const DEFAULT_MAP_DETECTION_STATUS: &str = "pending";

// --- History view ---

/// Cards per history page. Overridden by `HISTORY_PAGE_SIZE`.
pub const DEFAULT_HISTORY_PAGE_SIZE: usize = 6;

// --- In-memory caches ---

/// Idle planning sessions are dropped after 2 hours. Overridden by `SESSION_TTL`.
pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 7_200;
/// Upper bound on concurrently tracked planning sessions.
pub const MAX_PLANNING_SESSIONS: u64 = 10_000;
/// Reverse-geocoding results are kept for 7 days. Overridden by `GEOCODE_CACHE_TTL`.
pub const DEFAULT_GEOCODE_CACHE_TTL_SECONDS: u64 = 604_800;
/// Maximum cached reverse-geocoding entries.
pub const MAX_GEOCODE_CACHE_ENTRIES: u64 = 5_000;

// --- Request headers understood by the HTTP surface ---

/// Device location header, formatted `<lat>,<lng>`.
pub const DEVICE_LOCATION_HEADER: &str = "x-device-location";
/// Planning session header. Route computation state is keyed on it.
pub const SESSION_ID_HEADER: &str = "x-session-id";
