//! In-memory collaborators for tests and demos.
//!
//! Each store is a `Mutex` around plain state. The trip and position
//! stores can be told to fail on demand, which is how the degraded-mode
//! paths (provisional trips, swallowed write failures) get exercised.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use geo::LineString;
use rustc_hash::FxHashMap;

use crate::store::*;
use crate::track::RawFix;

#[derive(Default)]
pub struct MemoryRouteStore {
    routes: Mutex<FxHashMap<String, LineString>>,
}

impl MemoryRouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, route_id: &str, path: LineString) {
        self.routes
            .lock()
            .unwrap()
            .insert(route_id.to_string(), path);
    }
}

impl RouteStore for MemoryRouteStore {
    fn load_route(&self, route_id: &str) -> Result<LineString, StoreError> {
        self.routes
            .lock()
            .unwrap()
            .get(route_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("route {route_id}")))
    }
}

#[derive(Default)]
pub struct MemoryTripStore {
    trips: Mutex<Vec<TripRecord>>,
    sequence: AtomicU64,
    fail_creates: AtomicBool,
    fail_finishes: AtomicBool,
}

impl MemoryTripStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, `create_trip` reports the store as unavailable.
    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    /// While set, `finish_trip` reports the store as unavailable.
    pub fn fail_finishes(&self, fail: bool) {
        self.fail_finishes.store(fail, Ordering::SeqCst);
    }

    /// Seeds a record directly, bypassing `create_trip`. Stands in for a
    /// trip another path (or another client) registered with the backend.
    pub fn seed(&self, record: TripRecord) {
        self.trips.lock().unwrap().push(record);
    }

    pub fn records(&self) -> Vec<TripRecord> {
        self.trips.lock().unwrap().clone()
    }
}

impl TripStore for MemoryTripStore {
    fn create_trip(
        &self,
        route_id: &str,
        vehicle_id: Option<&str>,
    ) -> Result<TripRecord, StoreError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("create_trip disabled".into()));
        }

        let record = TripRecord {
            id: format!("trip-{}", self.sequence.fetch_add(1, Ordering::SeqCst) + 1),
            route_id: route_id.to_string(),
            vehicle_id: vehicle_id.map(str::to_string),
            status: "en curso".to_string(),
        };

        self.trips.lock().unwrap().push(record.clone());
        Ok(record)
    }

    fn list_trips(&self) -> Result<Vec<TripRecord>, StoreError> {
        Ok(self.trips.lock().unwrap().clone())
    }

    fn finish_trip(&self, trip_id: &str) -> Result<(), StoreError> {
        if self.fail_finishes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("finish_trip disabled".into()));
        }

        let mut trips = self.trips.lock().unwrap();
        match trips.iter_mut().find(|record| record.id == trip_id) {
            Some(record) => {
                record.status = "finalizado".to_string();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("trip {trip_id}"))),
        }
    }
}

#[derive(Default)]
pub struct MemoryPositionStore {
    rows: Mutex<Vec<(String, f64, f64, f64)>>,
    fail_appends: AtomicBool,
}

impl MemoryPositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<(String, f64, f64, f64)> {
        self.rows.lock().unwrap().clone()
    }
}

impl PositionStore for MemoryPositionStore {
    fn append_position(
        &self,
        trip_id: &str,
        lat: f64,
        lng: f64,
        speed: f64,
    ) -> Result<(), StoreError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("append disabled".into()));
        }

        self.rows
            .lock()
            .unwrap()
            .push((trip_id.to_string(), lat, lng, speed));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryRealtimeStore {
    rows: Mutex<Vec<PositionInsert>>,
}

impl MemoryRealtimeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<PositionInsert> {
        self.rows.lock().unwrap().clone()
    }
}

impl RealtimeStore for MemoryRealtimeStore {
    fn insert_position(&self, row: &PositionInsert) -> Result<(), StoreError> {
        self.rows.lock().unwrap().push(row.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBroadcast {
    messages: Mutex<Vec<(String, PositionBroadcast)>>,
    signals: Mutex<Vec<(String, TripSignal)>>,
}

impl MemoryBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(String, PositionBroadcast)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn signals(&self) -> Vec<(String, TripSignal)> {
        self.signals.lock().unwrap().clone()
    }
}

impl BroadcastChannel for MemoryBroadcast {
    fn publish(&self, channel: &str, message: &PositionBroadcast) {
        self.messages
            .lock()
            .unwrap()
            .push((channel.to_string(), message.clone()));
    }

    fn publish_signal(&self, channel: &str, signal: &TripSignal) {
        self.signals
            .lock()
            .unwrap()
            .push((channel.to_string(), signal.clone()));
    }
}

/// A key-value slot holding the snapshot as a JSON string, the way a
/// device preference store would.
#[derive(Default)]
pub struct MemorySlot {
    slot: Mutex<Option<String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PositionSlot for MemorySlot {
    fn save(&self, snapshot: &StoredPosition) -> Result<(), StoreError> {
        let json = serde_json::to_string(snapshot)
            .map_err(|err| StoreError::Rejected(err.to_string()))?;

        *self.slot.lock().unwrap() = Some(json);
        Ok(())
    }

    fn load(&self) -> Result<Option<StoredPosition>, StoreError> {
        self.slot
            .lock()
            .unwrap()
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|err| StoreError::Rejected(err.to_string()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().unwrap() = None;
        Ok(())
    }
}

/// A GPS provider fed from a scripted queue of fixes.
pub struct ScriptedGps {
    queue: Mutex<VecDeque<RawFix>>,
    permission: AtomicBool,
    watch: Mutex<Option<(WatchId, Box<dyn FnMut(RawFix) + Send>)>>,
    next_watch: AtomicU64,
}

impl ScriptedGps {
    pub fn new(fixes: impl IntoIterator<Item = RawFix>) -> Self {
        ScriptedGps {
            queue: Mutex::new(fixes.into_iter().collect()),
            permission: AtomicBool::new(true),
            watch: Mutex::new(None),
            next_watch: AtomicU64::new(1),
        }
    }

    pub fn deny_permission(&self) {
        self.permission.store(false, Ordering::SeqCst);
    }

    pub fn watching(&self) -> bool {
        self.watch.lock().unwrap().is_some()
    }

    /// Delivers the next scripted fix to the active watch, if any.
    /// Returns whether a fix was delivered.
    pub fn emit(&self) -> bool {
        let Some(fix) = self.queue.lock().unwrap().pop_front() else {
            return false;
        };

        if let Some((_, callback)) = self.watch.lock().unwrap().as_mut() {
            callback(fix);
            return true;
        }

        false
    }
}

impl GpsProvider for ScriptedGps {
    fn check_permission(&self) -> Result<bool, StoreError> {
        Ok(self.permission.load(Ordering::SeqCst))
    }

    fn request_permission(&self) -> Result<bool, StoreError> {
        Ok(self.permission.load(Ordering::SeqCst))
    }

    fn current_position(&self) -> Result<RawFix, StoreError> {
        if !self.permission.load(Ordering::SeqCst) {
            return Err(StoreError::PermissionDenied);
        }

        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| StoreError::Unavailable("no scripted fixes left".into()))
    }

    fn watch(&self, callback: Box<dyn FnMut(RawFix) + Send>) -> Result<WatchId, StoreError> {
        if !self.permission.load(Ordering::SeqCst) {
            return Err(StoreError::PermissionDenied);
        }

        let id = self.next_watch.fetch_add(1, Ordering::SeqCst);
        *self.watch.lock().unwrap() = Some((id, callback));
        Ok(id)
    }

    fn clear_watch(&self, id: WatchId) {
        let mut watch = self.watch.lock().unwrap();
        if watch.as_ref().map(|(held, _)| *held) == Some(id) {
            *watch = None;
        }
    }
}
