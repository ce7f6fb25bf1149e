//! Lifecycle of a single vehicle's run along a route.
//!
//! The [`TripTracker`] owns the snapper and the position sink for the
//! active trip, persists the last-known position for resumption, and
//! handles promotion of provisional trip identifiers once the durable
//! store acknowledges the run.

#[doc(hidden)]
pub mod entity;
#[doc(hidden)]
pub mod session;
#[doc(hidden)]
pub mod tracker;

#[doc(inline)]
pub use entity::{
    FinishHeuristic, Trip, TripError, TripEvent, TripState, PROVISIONAL_PREFIX,
};
#[doc(inline)]
pub use session::TripSession;
#[doc(inline)]
pub use tracker::{TripTracker, PROMOTION_INTERVAL_MS, PROMOTION_MAX_ATTEMPTS};
