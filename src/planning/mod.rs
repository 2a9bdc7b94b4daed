//! URL-driven planning workflow: query codec, mode machine, marker
//! selection, filters and pagination, plus the pure routing helpers
//! (polyline codec and request builder).

pub mod filters;
pub mod mode;
pub mod pagination;
pub mod polyline;
pub mod query;
pub mod request_builder;
pub mod selection;
pub mod state;

pub use filters::{apply_filters, derive_facets, DistanceBucket, Facets, FilterCriteria};
pub use mode::{ModeAction, PlanningMode};
pub use pagination::{paginate, Page};
pub use query::QueryState;
pub use request_builder::{MapOrigin, RouteRequestBuilder};
pub use selection::SelectionSet;
pub use state::PlanningState;
