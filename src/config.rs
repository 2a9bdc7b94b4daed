use crate::constants::*;
use crate::models::TravelMode;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Base URL of the detections/collector backend
    pub backend_url: String,
    pub routes_api_key: String,
    pub routes_api_base_url: Option<String>,
    pub nominatim_base_url: Option<String>,
    /// Detection status shown on the dashboard map
    pub map_detection_status: String,
    pub history_page_size: usize,
    pub session_ttl: u64,
    pub geocode_cache_ttl: u64,
    pub routing: RoutingConfig,
}

/// Knobs for the Routes API request body.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingConfig {
    pub travel_mode: TravelMode,

    /// BCP-47 language used for warnings and descriptions
    pub language_code: String,

    /// `METRIC` or `IMPERIAL`
    pub units: String,

    pub avoid_tolls: bool,
    pub avoid_highways: bool,
    pub avoid_ferries: bool,

    /// Let the provider reorder intermediate stops. The destination never moves.
    pub optimize_waypoint_order: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            travel_mode: TravelMode::Drive,
            language_code: "pt-BR".to_string(),
            units: "METRIC".to_string(),
            avoid_tolls: false,
            avoid_highways: false,
            avoid_ferries: true,
            optimize_waypoint_order: true,
        }
    }
}

impl RoutingConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let units = env::var("ROUTE_UNITS").unwrap_or(defaults.units);
        if units != "METRIC" && units != "IMPERIAL" {
            return Err(format!(
                "Invalid ROUTE_UNITS: {}. Use 'METRIC' or 'IMPERIAL'",
                units
            ));
        }

        Ok(Self {
            travel_mode: env::var("ROUTE_TRAVEL_MODE")
                .unwrap_or_else(|_| defaults.travel_mode.to_string())
                .parse()?,

            language_code: env::var("ROUTE_LANGUAGE_CODE").unwrap_or(defaults.language_code),

            units,

            avoid_tolls: env::var("ROUTE_AVOID_TOLLS")
                .unwrap_or_else(|_| defaults.avoid_tolls.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_AVOID_TOLLS")?,

            avoid_highways: env::var("ROUTE_AVOID_HIGHWAYS")
                .unwrap_or_else(|_| defaults.avoid_highways.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_AVOID_HIGHWAYS")?,

            avoid_ferries: env::var("ROUTE_AVOID_FERRIES")
                .unwrap_or_else(|_| defaults.avoid_ferries.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_AVOID_FERRIES")?,

            optimize_waypoint_order: env::var("ROUTE_OPTIMIZE_WAYPOINT_ORDER")
                .unwrap_or_else(|_| defaults.optimize_waypoint_order.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_OPTIMIZE_WAYPOINT_ORDER")?,
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        let backend_url = env::var("BACKEND_URL")
            .or_else(|_| env::var("SERVER_URL_DATABASE"))
            .map_err(|_| "BACKEND_URL must be set")?;

        let routes_api_key = env::var("ROUTES_API_KEY")
            .or_else(|_| env::var("GOOGLE_MAPS_API_KEY"))
            .map_err(|_| "ROUTES_API_KEY must be set")?;

        let history_page_size: usize = env::var("HISTORY_PAGE_SIZE")
            .unwrap_or_else(|_| DEFAULT_HISTORY_PAGE_SIZE.to_string())
            .parse()
            .map_err(|_| "Invalid HISTORY_PAGE_SIZE")?;

        if history_page_size == 0 || history_page_size > 100 {
            return Err("HISTORY_PAGE_SIZE must be between 1 and 100".to_string());
        }

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| "Invalid PORT")?,
            backend_url: backend_url.trim_end_matches('/').to_string(),
            routes_api_key,
            routes_api_base_url: env::var("ROUTES_API_BASE_URL").ok(),
            nominatim_base_url: env::var("NOMINATIM_BASE_URL").ok(),
            map_detection_status: env::var("MAP_DETECTION_STATUS")
                .unwrap_or_else(|_| DEFAULT_MAP_DETECTION_STATUS.to_string()),
            history_page_size,
            session_ttl: env::var("SESSION_TTL")
                .unwrap_or_else(|_| DEFAULT_SESSION_TTL_SECONDS.to_string())
                .parse()
                .map_err(|_| "Invalid SESSION_TTL")?,
            geocode_cache_ttl: env::var("GEOCODE_CACHE_TTL")
                .unwrap_or_else(|_| DEFAULT_GEOCODE_CACHE_TTL_SECONDS.to_string())
                .parse()
                .map_err(|_| "Invalid GEOCODE_CACHE_TTL")?,
            routing: RoutingConfig::from_env()?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
