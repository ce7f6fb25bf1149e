//! Contracts for the external collaborators the tracking core talks to.
//!
//! The core never reaches for a shared client object; every collaborator
//! is injected as a trait object, which is also what lets the tests and
//! demos run against the [`memory`] implementations.

use geo::LineString;
use serde::{Deserialize, Serialize};

use crate::impl_err;
use crate::track::RawFix;

#[doc(hidden)]
pub mod memory;

/// Broadcast channel carrying throttled live positions.
pub const POSITION_CHANNEL: &str = "posiciones-live";
/// Broadcast channel carrying trip lifecycle signals.
pub const TRIP_CHANNEL: &str = "recorridos-live";

/// Status tokens the durable store uses for a trip still underway.
const RUNNING_TOKENS: [&str; 4] = ["en curso", "in_progress", "activo", "running"];

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    Unavailable(String),
    Rejected(String),
    PermissionDenied,
    NotFound(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable(reason) => write!(f, "store unavailable: {reason}"),
            StoreError::Rejected(reason) => write!(f, "store rejected request: {reason}"),
            StoreError::PermissionDenied => write!(f, "permission denied"),
            StoreError::NotFound(what) => write!(f, "not found: {what}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl_err!(StoreError, Store);

/// A trip as the durable store reports it. `status` is the store's own
/// free-form state string; [`TripRecord::is_running`] matches it against
/// the tokens the backend is known to use.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub id: String,
    pub route_id: String,
    pub vehicle_id: Option<String>,
    pub status: String,
}

impl TripRecord {
    pub fn is_running(&self) -> bool {
        let status = self.status.to_lowercase();
        RUNNING_TOKENS.iter().any(|token| status.contains(token))
    }
}

/// Row shape for the realtime-database position insert.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionInsert {
    pub trip_id: String,
    pub route_id: String,
    pub lat: f64,
    pub lng: f64,
    pub speed: f64,
}

/// Payload published on [`POSITION_CHANNEL`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionBroadcast {
    pub trip_id: String,
    pub route_id: String,
    pub lat: f64,
    pub lng: f64,
}

/// Trip lifecycle signal published on [`TRIP_CHANNEL`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TripSignal {
    pub action: TripAction,
    pub trip_id: String,
    pub record: Option<TripRecord>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripAction {
    Start,
    Finish,
}

/// Most recent self-position, persisted locally for resumption.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredPosition {
    pub trip_id: String,
    pub lat: f64,
    pub lng: f64,
    pub timestamp_ms: i64,
}

/// Supplies route geometries, e.g. decoded from a GeoJSON LineString.
pub trait RouteStore: Send + Sync {
    fn load_route(&self, route_id: &str) -> Result<LineString, StoreError>;
}

/// The durable trip record store.
pub trait TripStore: Send + Sync {
    fn create_trip(
        &self,
        route_id: &str,
        vehicle_id: Option<&str>,
    ) -> Result<TripRecord, StoreError>;

    fn list_trips(&self) -> Result<Vec<TripRecord>, StoreError>;

    fn finish_trip(&self, trip_id: &str) -> Result<(), StoreError>;
}

/// Durable, REST-like position history.
pub trait PositionStore: Send + Sync {
    fn append_position(
        &self,
        trip_id: &str,
        lat: f64,
        lng: f64,
        speed: f64,
    ) -> Result<(), StoreError>;
}

/// Realtime-database position table.
pub trait RealtimeStore: Send + Sync {
    fn insert_position(&self, row: &PositionInsert) -> Result<(), StoreError>;
}

/// Fire-and-forget broadcast fan-out.
pub trait BroadcastChannel: Send + Sync {
    fn publish(&self, channel: &str, message: &PositionBroadcast);

    fn publish_signal(&self, channel: &str, signal: &TripSignal);
}

/// Key-value slot for the driver's last-known position.
pub trait PositionSlot: Send + Sync {
    fn save(&self, snapshot: &StoredPosition) -> Result<(), StoreError>;

    fn load(&self) -> Result<Option<StoredPosition>, StoreError>;

    fn clear(&self) -> Result<(), StoreError>;
}

/// Opaque handle to an active geolocation watch.
pub type WatchId = u64;

/// The device GPS.
pub trait GpsProvider: Send + Sync {
    fn check_permission(&self) -> Result<bool, StoreError>;

    fn request_permission(&self) -> Result<bool, StoreError>;

    fn current_position(&self) -> Result<RawFix, StoreError>;

    /// Registers a sample callback; returns the handle to clear it with.
    fn watch(&self, callback: Box<dyn FnMut(RawFix) + Send>) -> Result<WatchId, StoreError>;

    /// Clearing an unknown or already-cleared watch is a no-op.
    fn clear_watch(&self, id: WatchId);
}
