//! Planar-approximation geometry over [`geo`] primitives.
//!
//! Everything here assumes metro-scale extents: a single city, nowhere
//! near the poles, nowhere near the antimeridian. Within that envelope
//! the equirectangular scaling used by [`project_onto_segment`] stays
//! under 1% error against a great-circle ground truth.

/// Default spacing applied when resampling a route polyline, in meters.
pub const DEFAULT_MAX_STEP_METERS: f64 = 5.0;

/// Meters spanned by one degree of latitude (and of longitude at the
/// equator, before the `cos(lat)` correction).
pub const METERS_PER_DEGREE: f64 = 111_320.0;

#[doc(hidden)]
pub mod densify;
#[doc(hidden)]
pub mod error;
#[doc(hidden)]
pub mod project;
#[cfg(test)]
mod test;

#[doc(inline)]
pub use densify::densify;
#[doc(inline)]
pub use error::GeoError;
#[doc(inline)]
pub use project::{checked_point, nearest_index, path_length, project_onto_segment, Projection};
