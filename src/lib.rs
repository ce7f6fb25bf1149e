#![doc = include_str!("../README.md")]

pub mod geo;
pub mod relay;
#[cfg(feature = "sched")]
pub mod sched;
pub mod sink;
pub mod store;
pub mod track;
pub mod trip;
pub mod util;

#[doc(inline)]
pub use relay::Relay;
#[doc(inline)]
pub use sink::PositionSink;
#[doc(inline)]
pub use track::Snapper;
#[doc(inline)]
pub use trip::TripTracker;

/// Crate-level error, aggregating the submodule error types. Submodules
/// convert into it with the [`impl_err!`] macro.
#[derive(Debug)]
pub enum Error {
    Geo(geo::GeoError),
    Store(store::StoreError),
    Trip(trip::TripError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Geo(err) => write!(f, "{err}"),
            Error::Store(err) => write!(f, "{err}"),
            Error::Trip(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {}
