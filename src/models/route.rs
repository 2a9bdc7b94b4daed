use crate::config::RoutingConfig;
use crate::models::Waypoint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelMode {
    #[default]
    Drive,
    Walk,
    Bicycle,
    Transit,
}

impl TravelMode {
    /// Wire name in Routes API requests
    pub fn api_name(&self) -> &'static str {
        match self {
            TravelMode::Drive => "DRIVE",
            TravelMode::Walk => "WALK",
            TravelMode::Bicycle => "BICYCLE",
            TravelMode::Transit => "TRANSIT",
        }
    }

    /// Only motorized modes accept a routing preference.
    pub fn supports_routing_preference(&self) -> bool {
        matches!(self, TravelMode::Drive)
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TravelMode::Drive => write!(f, "drive"),
            TravelMode::Walk => write!(f, "walk"),
            TravelMode::Bicycle => write!(f, "bicycle"),
            TravelMode::Transit => write!(f, "transit"),
        }
    }
}

impl FromStr for TravelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "drive" | "driving" => Ok(TravelMode::Drive),
            "walk" | "walking" => Ok(TravelMode::Walk),
            "bicycle" | "bike" | "cycling" => Ok(TravelMode::Bicycle),
            "transit" => Ok(TravelMode::Transit),
            _ => Err(format!("Invalid travel mode: '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingPreference {
    TrafficUnaware,
    TrafficAwareOptimal,
}

// Request types for POST directions/v2:computeRoutes

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Waypoint> for LatLng {
    fn from(w: Waypoint) -> Self {
        LatLng {
            latitude: w.lat,
            longitude: w.lng,
        }
    }
}

impl From<LatLng> for Waypoint {
    fn from(l: LatLng) -> Self {
        Waypoint {
            lat: l.latitude,
            lng: l.longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub lat_lng: LatLng,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RouteLocation {
    pub location: Location,
}

impl RouteLocation {
    pub fn waypoint(&self) -> Waypoint {
        self.location.lat_lng.into()
    }
}

impl From<Waypoint> for RouteLocation {
    fn from(w: Waypoint) -> Self {
        RouteLocation {
            location: Location { lat_lng: w.into() },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RouteModifiers {
    pub avoid_tolls: bool,
    pub avoid_highways: bool,
    pub avoid_ferries: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteComputationRequest {
    pub origin: RouteLocation,
    pub destination: RouteLocation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intermediates: Vec<RouteLocation>,
    pub travel_mode: TravelMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_preference: Option<RoutingPreference>,
    pub compute_alternative_routes: bool,
    pub route_modifiers: RouteModifiers,
    pub language_code: String,
    pub units: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optimize_waypoint_order: bool,
}

impl RouteComputationRequest {
    /// Assembles the request body. Waypoint optimization is only requested
    /// when there is something to reorder, and switches the routing
    /// preference to `TRAFFIC_UNAWARE`, which the API requires for it.
    pub fn new(
        origin: Waypoint,
        destination: Waypoint,
        intermediates: Vec<Waypoint>,
        config: &RoutingConfig,
    ) -> Self {
        let optimize = config.optimize_waypoint_order && !intermediates.is_empty();
        let routing_preference = config.travel_mode.supports_routing_preference().then(|| {
            if optimize {
                RoutingPreference::TrafficUnaware
            } else {
                RoutingPreference::TrafficAwareOptimal
            }
        });

        RouteComputationRequest {
            origin: origin.into(),
            destination: destination.into(),
            intermediates: intermediates.into_iter().map(RouteLocation::from).collect(),
            travel_mode: config.travel_mode,
            routing_preference,
            compute_alternative_routes: false,
            route_modifiers: RouteModifiers {
                avoid_tolls: config.avoid_tolls,
                avoid_highways: config.avoid_highways,
                avoid_ferries: config.avoid_ferries,
            },
            language_code: config.language_code.clone(),
            units: config.units.clone(),
            optimize_waypoint_order: optimize,
        }
    }

    pub fn destination_waypoint(&self) -> Waypoint {
        self.destination.waypoint()
    }

    pub fn intermediate_waypoints(&self) -> Vec<Waypoint> {
        self.intermediates.iter().map(|l| l.waypoint()).collect()
    }
}

// Response types

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RouteResult {
    #[serde(default)]
    pub routes: Vec<Route>,
}

impl RouteResult {
    /// The API is asked for a single route; the first one is the answer.
    pub fn primary(&self) -> Option<&Route> {
        self.routes.first()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EncodedPolyline {
    #[serde(rename = "encodedPolyline", default)]
    pub encoded_polyline: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteLeg {
    #[serde(default)]
    pub distance_meters: u64,
    #[serde(default)]
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_location: Option<Location>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[serde(default)]
    pub distance_meters: u64,
    /// Seconds with an `s` suffix, e.g. `"1234s"`
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub polyline: EncodedPolyline,
    #[serde(default)]
    pub legs: Vec<RouteLeg>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub optimized_intermediate_waypoint_index: Vec<usize>,
}

/// Parses `"<seconds>s"` durations. Fractional seconds are truncated.
pub fn parse_duration_seconds(raw: &str) -> Option<u64> {
    let digits = raw.trim().strip_suffix('s')?;
    digits
        .parse::<u64>()
        .ok()
        .or_else(|| digits.parse::<f64>().ok().filter(|s| *s >= 0.0).map(|s| s as u64))
}

/// `"<h>h <m>m"` or `"<m>m"` when under an hour
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Kilometres rounded to one decimal
pub fn format_distance_km(meters: u64) -> f64 {
    (meters as f64 / 100.0).round() / 10.0
}

/// Numbers shown in the route summary panel.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub duration_seconds: u64,
    pub duration_text: String,
    pub stops: usize,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RouteSummary {
    pub fn from_route(route: &Route) -> Self {
        let duration_seconds = parse_duration_seconds(&route.duration).unwrap_or(0);
        RouteSummary {
            distance_km: format_distance_km(route.distance_meters),
            duration_seconds,
            duration_text: format_duration(duration_seconds),
            stops: route.legs.len(),
            warnings: route.warnings.clone(),
            description: route.description.clone(),
        }
    }
}

/// Decoded route path as a GeoJSON `LineString` feature. Coordinates are
/// `[lng, lat]` as GeoJSON requires.
pub fn path_feature(path: &[Waypoint], summary: Option<&RouteSummary>) -> geojson::Feature {
    let line: geo::LineString<f64> = path.iter().map(|&w| geo::Coord::from(w)).collect();
    let geometry = geojson::Geometry::new(geojson::Value::from(&line));

    let properties = summary.and_then(|s| match serde_json::to_value(s) {
        Ok(serde_json::Value::Object(map)) => Some(map),
        _ => None,
    });

    geojson::Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties,
        foreign_members: None,
    }
}
