use chrono::{DateTime, Utc};

use crate::geo::GeoError;
use crate::impl_err;
use crate::store::StoreError;
use crate::track::SnappedFix;

/// Reserved prefix marking a locally-generated trip identifier that the
/// durable store has not acknowledged (yet).
pub const PROVISIONAL_PREFIX: &str = "local-";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TripState {
    Idle,
    Active,
    Finishing,
}

/// One run of a vehicle along a route.
///
/// The identifier may be provisional until promotion (see
/// [`TripTracker`](crate::trip::TripTracker)); everything downstream of
/// the tracker treats the id as opaque either way.
#[derive(Clone, Debug)]
pub struct Trip {
    pub id: String,
    pub route_id: String,
    pub vehicle_id: Option<String>,
    pub state: TripState,
    pub started_at: DateTime<Utc>,
    pub last_persisted_fix: Option<SnappedFix>,
}

impl Trip {
    pub fn is_provisional(&self) -> bool {
        self.id.starts_with(PROVISIONAL_PREFIX)
    }

    pub(crate) fn provisional_id(now: DateTime<Utc>) -> String {
        format!("{PROVISIONAL_PREFIX}{}", now.timestamp_millis())
    }
}

/// State changes the host (UI or service layer) may care about, delivered
/// through the tracker's callback list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TripEvent {
    Started { trip_id: String },
    /// The provisional identifier was swapped for the durable one.
    Promoted { from: String, to: String },
    /// Promotion polling ran out of attempts; the trip stays provisional.
    PromotionAbandoned { trip_id: String },
    /// The vehicle is close enough to the end of the route to ask the
    /// driver whether the run is done. Fires at most once per trip.
    FinishPrompt { trip_id: String },
    Finished { trip_id: String },
}

/// End-of-route detection thresholds. Tuned empirically; hosts that see
/// early or late prompts should adjust these rather than the detector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FinishHeuristic {
    pub max_segments_left: usize,
    pub max_meters_to_end: f64,
}

impl Default for FinishHeuristic {
    fn default() -> Self {
        FinishHeuristic {
            max_segments_left: 2,
            max_meters_to_end: 15.0,
        }
    }
}

#[derive(Debug)]
pub enum TripError {
    /// The operation needs an Active (or Finishing) trip and there is none.
    NotActive,
    /// A trip is already underway in this session.
    AlreadyActive(String),
    /// The route geometry is unusable (out-of-range vertex).
    BadRoute(GeoError),
    Store(StoreError),
}

impl std::fmt::Display for TripError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TripError::NotActive => write!(f, "no active trip"),
            TripError::AlreadyActive(id) => write!(f, "trip {id} already active"),
            TripError::BadRoute(err) => write!(f, "route rejected: {err}"),
            TripError::Store(err) => write!(f, "store failure: {err}"),
        }
    }
}

impl std::error::Error for TripError {}

impl From<StoreError> for TripError {
    fn from(value: StoreError) -> Self {
        TripError::Store(value)
    }
}

impl_err!(TripError, Trip);
