use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, warn};

use crate::store::{GpsProvider, StoreError, WatchId};
use crate::trip::entity::TripError;
use crate::trip::tracker::TripTracker;

/// A [`TripTracker`] wired to the device GPS.
///
/// The geolocation watch is a trip-scoped resource: it is acquired when
/// tracking begins, feeds every sample into
/// [`ingest`](TripTracker::ingest), and is released when the trip ends,
/// when a start fails, and when the session is dropped. The tracker sits
/// behind a mutex so the watch callback and the host (promotion polling,
/// finish prompts) share it.
pub struct TripSession {
    tracker: Arc<Mutex<TripTracker>>,
    gps: Arc<dyn GpsProvider>,
    watch: Option<WatchId>,
}

impl TripSession {
    pub fn new(tracker: TripTracker, gps: Arc<dyn GpsProvider>) -> Self {
        TripSession {
            tracker: Arc::new(Mutex::new(tracker)),
            gps,
            watch: None,
        }
    }

    /// Shared handle to the tracker, for promotion polling, event
    /// listeners, and state queries.
    pub fn tracker(&self) -> Arc<Mutex<TripTracker>> {
        Arc::clone(&self.tracker)
    }

    pub fn watching(&self) -> bool {
        self.watch.is_some()
    }

    /// [`TripTracker::start`], with the GPS watch attached once the trip
    /// is Active. A failed start leaves no watch behind.
    pub fn start(&mut self, route_id: &str, vehicle_id: Option<&str>) -> Result<(), TripError> {
        self.ensure_permission()?;
        lock(&self.tracker).start(route_id, vehicle_id)?;
        self.attach_watch()
    }

    /// [`TripTracker::resume`]. The watch is attached only when there was
    /// a trip to resume.
    pub fn resume(&mut self, route_id: &str, vehicle_id: Option<&str>) -> Result<bool, TripError> {
        self.ensure_permission()?;
        if !lock(&self.tracker).resume(route_id, vehicle_id)? {
            return Ok(false);
        }

        self.attach_watch()?;
        Ok(true)
    }

    /// [`TripTracker::finish`]. The watch is released first, whatever the
    /// finish outcome.
    pub fn finish(&mut self) -> Result<(), TripError> {
        self.release_watch();
        lock(&self.tracker).finish()
    }

    fn ensure_permission(&self) -> Result<(), TripError> {
        if self.gps.check_permission()? || self.gps.request_permission()? {
            return Ok(());
        }

        Err(StoreError::PermissionDenied.into())
    }

    /// Registers the ingest callback with the GPS. If the watch cannot be
    /// acquired the just-started trip is rolled back; tracking without a
    /// position source is a stuck marker, not a trip.
    fn attach_watch(&mut self) -> Result<(), TripError> {
        let tracker = Arc::clone(&self.tracker);
        let callback = Box::new(move |raw: crate::track::RawFix| {
            if let Err(err) = lock(&tracker).ingest(&raw, raw.timestamp_ms) {
                debug!("watch sample dropped: {err}");
            }
        });

        match self.gps.watch(callback) {
            Ok(id) => {
                self.watch = Some(id);
                Ok(())
            }
            Err(err) => {
                warn!("gps watch failed ({err}); ending the trip");
                let _ = lock(&self.tracker).finish();
                Err(err.into())
            }
        }
    }

    fn release_watch(&mut self) {
        if let Some(id) = self.watch.take() {
            self.gps.clear_watch(id);
        }
    }
}

impl Drop for TripSession {
    fn drop(&mut self) {
        self.release_watch();
    }
}

fn lock(tracker: &Mutex<TripTracker>) -> MutexGuard<'_, TripTracker> {
    tracker.lock().unwrap_or_else(PoisonError::into_inner)
}
