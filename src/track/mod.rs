//! Route snapping for a live GPS stream.
//!
//! A [`Snapper`] owns a densified route polyline and a forward-only
//! [`SnapCursor`]; feeding it [`RawFix`]es yields [`SnappedFix`]es that sit
//! on the route, hold position through lateral outliers, and never walk
//! backwards along the path.

#[doc(hidden)]
pub mod cursor;
#[doc(hidden)]
pub mod fix;
#[doc(hidden)]
pub mod snapper;

#[doc(inline)]
pub use cursor::SnapCursor;
#[doc(inline)]
pub use fix::{RawFix, SnappedFix, FALLBACK_SPEED_MPS};
#[doc(inline)]
pub use snapper::{Snapper, DEFAULT_MAX_LATERAL_METERS};
