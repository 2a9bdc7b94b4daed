pub mod detection;
pub mod geometry;
pub mod route;
pub mod waypoint;

pub use detection::{ClassCount, Detection, RawClassCount, RawDetection, WasteCategory};
pub use geometry::{DetectionGeometry, OverlayContour, PixelContour};
pub use route::{
    Route, RouteComputationRequest, RouteLeg, RouteResult, RouteSummary, TravelMode,
};
pub use waypoint::Waypoint;
