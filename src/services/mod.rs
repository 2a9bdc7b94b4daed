pub mod backend;
pub mod geocoder;
pub mod route_computation;
pub mod routes_api;
pub mod sessions;

pub use backend::{BackendReply, DetectionOutcome, DetectionsBackend, HttpDetectionsBackend};
pub use geocoder::Geocoder;
pub use route_computation::{RouteComputation, RouteSnapshot};
pub use routes_api::{RouteProvider, RoutesApiClient};
pub use sessions::PlanningSessions;
