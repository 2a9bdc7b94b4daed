use crate::config::RoutingConfig;
use crate::constants::{EXTERNAL_MAPS_CURRENT_LOCATION, EXTERNAL_MAPS_DIR_URL};
use crate::error::{AppError, Result};
use crate::models::{RouteComputationRequest, Waypoint};
use std::fmt;

/// Start of an external directions link. When the device position is not
/// known the consumer maps app resolves its own current location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapOrigin {
    Coordinates(Waypoint),
    CurrentLocation,
}

impl From<Option<Waypoint>> for MapOrigin {
    fn from(origin: Option<Waypoint>) -> Self {
        origin.map_or(MapOrigin::CurrentLocation, MapOrigin::Coordinates)
    }
}

impl fmt::Display for MapOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapOrigin::Coordinates(w) => write!(f, "{}", w),
            MapOrigin::CurrentLocation => write!(f, "{}", EXTERNAL_MAPS_CURRENT_LOCATION),
        }
    }
}

/// Turns an origin plus ordered stops into a Routes API request.
///
/// The last stop is always the destination and the stops before it are the
/// intermediates, in the order given. Callers rely on this: the most
/// recently selected marker is where the route ends.
#[derive(Debug, Clone, Default)]
pub struct RouteRequestBuilder {
    config: RoutingConfig,
}

impl RouteRequestBuilder {
    pub fn new(config: RoutingConfig) -> Self {
        RouteRequestBuilder { config }
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub fn build(&self, origin: Waypoint, stops: &[Waypoint]) -> Result<RouteComputationRequest> {
        let (destination, intermediates) = split_stops(stops)?;
        Ok(RouteComputationRequest::new(
            origin,
            destination,
            intermediates.to_vec(),
            &self.config,
        ))
    }

    /// Directions deep link `.../maps/dir/<origin>/<stop>/.../<destination>`.
    /// Returns `None` when there are no stops.
    pub fn build_external_map_url(&self, origin: MapOrigin, stops: &[Waypoint]) -> Option<String> {
        let (destination, intermediates) = split_stops(stops).ok()?;

        let segments = std::iter::once(origin.to_string())
            .chain(intermediates.iter().map(Waypoint::to_string))
            .chain(std::iter::once(destination.to_string()))
            .collect::<Vec<_>>()
            .join("/");

        Some(format!("{}/{}", EXTERNAL_MAPS_DIR_URL, segments))
    }
}

fn split_stops(stops: &[Waypoint]) -> Result<(Waypoint, &[Waypoint])> {
    match stops.split_last() {
        Some((destination, intermediates)) => Ok((*destination, intermediates)),
        None => Err(AppError::InvalidRequest(
            "At least one stop is required to build a route".to_string(),
        )),
    }
}
