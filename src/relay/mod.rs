//! Observer-side live position relay.
//!
//! Non-driver clients see trips through three event sources that overlap
//! and drop independently: polled snapshots, realtime row inserts, and
//! broadcast messages. The [`Relay`] merges all three into per-trip
//! [`RemoteTripView`]s and animates markers between sightings. A periodic
//! [`reconcile`](Relay::reconcile) pass against polled trip statuses
//! sweeps up views whose finish events were dropped.

use geo::{LineString, Point};
use log::debug;
use rustc_hash::FxHashMap;

use crate::store::{PositionBroadcast, PositionInsert, TripAction, TripRecord, TripSignal};

#[doc(hidden)]
pub mod view;
#[cfg(test)]
mod test;

#[doc(inline)]
pub use view::{Animation, RemoteTripView, MAX_ANIMATION_MS, MIN_ANIMATION_MS};

/// Cadence of the status poll feeding [`Relay::reconcile`].
pub const RECONCILE_INTERVAL_MS: u64 = 5_000;

/// Merges position sightings into animated per-trip markers.
#[derive(Default)]
pub struct Relay {
    views: FxHashMap<String, RemoteTripView>,
    routes: FxHashMap<String, LineString>,
}

impl Relay {
    pub fn new() -> Self {
        Relay::default()
    }

    /// Registers route geometry for a trip so its marker follows the road
    /// instead of chord-cutting. Applies to the existing view too, if the
    /// trip was sighted first.
    pub fn set_route(&mut self, trip_id: &str, route: LineString) {
        if let Some(view) = self.views.get_mut(trip_id) {
            view.set_route(route.clone());
        }
        self.routes.insert(trip_id.to_string(), route);
    }

    /// One sighting of a trip, from any source. Creates the view on first
    /// sight; afterwards starts (or restarts) the marker animation.
    pub fn observe(&mut self, trip_id: &str, point: Point, sample_ms: i64, now_ms: i64) {
        match self.views.get_mut(trip_id) {
            Some(view) => view.observe(point, sample_ms, now_ms),
            None => {
                debug!("first sighting of trip {trip_id}");
                let mut view = RemoteTripView::new(trip_id, point, sample_ms);
                if let Some(route) = self.routes.get(trip_id) {
                    view.set_route(route.clone());
                }
                self.views.insert(trip_id.to_string(), view);
            }
        }
    }

    /// Sighting via realtime row insert.
    pub fn apply_insert(&mut self, row: &PositionInsert, sample_ms: i64, now_ms: i64) {
        self.observe(&row.trip_id, Point::new(row.lng, row.lat), sample_ms, now_ms);
    }

    /// Sighting via broadcast message.
    pub fn apply_broadcast(&mut self, message: &PositionBroadcast, sample_ms: i64, now_ms: i64) {
        self.observe(
            &message.trip_id,
            Point::new(message.lng, message.lat),
            sample_ms,
            now_ms,
        );
    }

    /// Trip lifecycle broadcast: a finish tears the view down right away,
    /// in-flight animation included. Starts need no action here; the view
    /// appears with the first position sighting.
    pub fn apply_signal(&mut self, signal: &TripSignal) {
        if signal.action == TripAction::Finish {
            self.finish(&signal.trip_id);
        }
    }

    /// Removes a trip's view, cancelling whatever animation was pending.
    pub fn finish(&mut self, trip_id: &str) {
        if self.views.remove(trip_id).is_some() {
            debug!("trip {trip_id} finished, view removed");
        }
        self.routes.remove(trip_id);
    }

    /// Advances all animations to `now_ms`; returns `(trip, marker)` for
    /// every live view.
    pub fn tick(&mut self, now_ms: i64) -> Vec<(String, Point)> {
        self.views
            .iter_mut()
            .map(|(trip_id, view)| (trip_id.clone(), view.tick(now_ms)))
            .collect()
    }

    /// Applies a polled status snapshot: any sighted trip the store
    /// reports as no longer running is removed. Covers finish signals
    /// that the realtime channel dropped.
    pub fn reconcile(&mut self, records: &[TripRecord]) {
        let finished: Vec<String> = records
            .iter()
            .filter(|record| !record.is_running() && self.views.contains_key(&record.id))
            .map(|record| record.id.clone())
            .collect();

        for trip_id in finished {
            debug!("reconcile: trip {trip_id} reported finished");
            self.finish(&trip_id);
        }
    }

    pub fn view(&self, trip_id: &str) -> Option<&RemoteTripView> {
        self.views.get(trip_id)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
