use std::sync::Arc;

use chrono::Utc;
use geo::{LineString, Point};
use log::{debug, info, warn};

use crate::geo::{checked_point, densify, path_length, DEFAULT_MAX_STEP_METERS};
use crate::sink::PositionSink;
use crate::store::{PositionSlot, RouteStore, StoredPosition, TripStore};
use crate::track::{RawFix, SnappedFix, Snapper};
use crate::trip::entity::{
    FinishHeuristic, Trip, TripError, TripEvent, TripState, PROVISIONAL_PREFIX,
};

/// Cadence of promotion polling against the durable store.
pub const PROMOTION_INTERVAL_MS: u64 = 2_000;
/// Polls before promotion is abandoned (~30s at the default cadence).
pub const PROMOTION_MAX_ATTEMPTS: u32 = 15;

/// Promotion polling state for a trip running on a provisional id.
#[derive(Clone, Debug)]
struct Promotion {
    attempts_left: u32,
}

type Listener = Box<dyn FnMut(&TripEvent) + Send>;

/// Driver-side trip state machine: `Idle -> Active -> Finishing -> Idle`.
///
/// Owns the snapper and the position sink while a trip is underway, and
/// assumes a single writer; it is the caller layer's job not to share one
/// tracker between sessions.
pub struct TripTracker {
    routes: Arc<dyn RouteStore>,
    trips: Arc<dyn TripStore>,
    slot: Arc<dyn PositionSlot>,
    sink: PositionSink,

    trip: Option<Trip>,
    snapper: Option<Snapper>,
    promotion: Option<Promotion>,
    finish_prompted: bool,

    heuristic: FinishHeuristic,
    listeners: Vec<Listener>,
}

impl TripTracker {
    pub fn new(
        routes: Arc<dyn RouteStore>,
        trips: Arc<dyn TripStore>,
        slot: Arc<dyn PositionSlot>,
        sink: PositionSink,
    ) -> Self {
        TripTracker {
            routes,
            trips,
            slot,
            sink,
            trip: None,
            snapper: None,
            promotion: None,
            finish_prompted: false,
            heuristic: FinishHeuristic::default(),
            listeners: Vec::new(),
        }
    }

    pub fn with_heuristic(mut self, heuristic: FinishHeuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Registers a listener for [`TripEvent`]s. Listeners are invoked
    /// synchronously, in registration order, on the caller's thread.
    pub fn on_event(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub fn state(&self) -> TripState {
        self.trip
            .as_ref()
            .map_or(TripState::Idle, |trip| trip.state)
    }

    pub fn trip(&self) -> Option<&Trip> {
        self.trip.as_ref()
    }

    pub fn snapper(&self) -> Option<&Snapper> {
        self.snapper.as_ref()
    }

    /// Starts a trip on `route_id`.
    ///
    /// If the durable store cannot create the record, the trip still goes
    /// Active on a provisional identifier and promotion polling is armed;
    /// the host should drive [`promotion_tick`](Self::promotion_tick)
    /// every [`PROMOTION_INTERVAL_MS`] until it returns `false`.
    pub fn start(&mut self, route_id: &str, vehicle_id: Option<&str>) -> Result<(), TripError> {
        if let Some(trip) = &self.trip {
            return Err(TripError::AlreadyActive(trip.id.clone()));
        }

        let path = self.checked_route(route_id)?;
        if path.0.len() < 2 {
            warn!("route {route_id} has {} point(s); snapping disabled", path.0.len());
        }

        let now = Utc::now();
        let id = match self.trips.create_trip(route_id, vehicle_id) {
            Ok(record) => record.id,
            Err(err) => {
                warn!("trip creation failed ({err}); starting on a provisional id");
                self.promotion = Some(Promotion {
                    attempts_left: PROMOTION_MAX_ATTEMPTS,
                });
                Trip::provisional_id(now)
            }
        };

        self.snapper = Some(Snapper::new(densify(&path, DEFAULT_MAX_STEP_METERS)));
        self.sink.reset();
        self.finish_prompted = false;
        self.trip = Some(Trip {
            id: id.clone(),
            route_id: route_id.to_string(),
            vehicle_id: vehicle_id.map(str::to_string),
            state: TripState::Active,
            started_at: now,
            last_persisted_fix: None,
        });

        info!(
            "trip {id} active on route {route_id} ({:.0}m)",
            path_length(&path)
        );
        self.emit(TripEvent::Started { trip_id: id });
        Ok(())
    }

    /// Restores an interrupted trip from the locally persisted position.
    ///
    /// Returns `Ok(false)` when there is nothing to resume. The snapper
    /// cursor is seeded near the stored position so forward motion is
    /// matched immediately, and a provisional stored id re-arms promotion.
    pub fn resume(&mut self, route_id: &str, vehicle_id: Option<&str>) -> Result<bool, TripError> {
        if let Some(trip) = &self.trip {
            return Err(TripError::AlreadyActive(trip.id.clone()));
        }

        let Some(stored) = self.slot.load()? else {
            return Ok(false);
        };

        let path = self.checked_route(route_id)?;
        let mut snapper = Snapper::new(densify(&path, DEFAULT_MAX_STEP_METERS));
        snapper.resume_near(Point::new(stored.lng, stored.lat));

        if stored.trip_id.starts_with(PROVISIONAL_PREFIX) {
            self.promotion = Some(Promotion {
                attempts_left: PROMOTION_MAX_ATTEMPTS,
            });
        }

        info!(
            "resuming trip {} on route {route_id} at segment {}",
            stored.trip_id,
            snapper.cursor().segment
        );

        self.snapper = Some(snapper);
        self.sink.reset();
        self.finish_prompted = false;
        self.trip = Some(Trip {
            id: stored.trip_id,
            route_id: route_id.to_string(),
            vehicle_id: vehicle_id.map(str::to_string),
            state: TripState::Active,
            started_at: Utc::now(),
            last_persisted_fix: None,
        });

        Ok(true)
    }

    pub fn promotion_pending(&self) -> bool {
        self.promotion.is_some()
    }

    /// One bounded promotion poll: scans the durable store for a running
    /// trip on the same route and, if found, swaps the provisional id in
    /// place. The sink retargets transparently since it is handed the id
    /// on every offer.
    ///
    /// Returns whether polling should continue.
    pub fn promotion_tick(&mut self) -> bool {
        let Some(promotion) = &mut self.promotion else {
            return false;
        };

        let Some(trip) = &mut self.trip else {
            // Trip ended while polling was still scheduled.
            self.promotion = None;
            return false;
        };

        match self.trips.list_trips() {
            Ok(records) => {
                let durable = records.iter().find(|record| {
                    record.is_running()
                        && record.route_id == trip.route_id
                        && !record.id.starts_with(PROVISIONAL_PREFIX)
                });

                if let Some(record) = durable {
                    let from = std::mem::replace(&mut trip.id, record.id.clone());
                    let to = trip.id.clone();
                    self.promotion = None;

                    info!("trip promoted: {from} -> {to}");
                    self.emit(TripEvent::Promoted { from, to });
                    return false;
                }
            }
            Err(err) => debug!("promotion poll failed: {err}"),
        }

        promotion.attempts_left -= 1;
        if promotion.attempts_left == 0 {
            let trip_id = trip.id.clone();
            self.promotion = None;

            warn!("promotion abandoned for {trip_id}; durable writes stay off");
            self.emit(TripEvent::PromotionAbandoned { trip_id });
            return false;
        }

        true
    }

    /// Ingests one raw GPS fix.
    ///
    /// Active trips snap the fix, persist it locally (every accepted fix,
    /// regardless of the sink's gates), fan it out, and run end-of-route
    /// detection. A fix with out-of-range coordinates is discarded, as if
    /// the sample never arrived. Finishing trips ignore fixes; with no
    /// trip at all this is an error.
    pub fn ingest(&mut self, raw: &RawFix, now_ms: i64) -> Result<Option<SnappedFix>, TripError> {
        let (Some(trip), Some(snapper)) = (&mut self.trip, &mut self.snapper) else {
            return Err(TripError::NotActive);
        };

        if trip.state != TripState::Active {
            return Ok(None);
        }

        if let Err(err) = checked_point(raw.lat, raw.lng) {
            warn!("fix discarded for {}: {err}", trip.id);
            return Ok(None);
        }

        let snapped = snapper.snap(raw);

        if let Err(err) = self.slot.save(&StoredPosition {
            trip_id: trip.id.clone(),
            lat: snapped.lat,
            lng: snapped.lng,
            timestamp_ms: snapped.timestamp_ms,
        }) {
            warn!("local position persist failed: {err}");
        }
        trip.last_persisted_fix = Some(snapped);

        self.sink.offer(&trip.id, &trip.route_id, &snapped, now_ms);

        let near_end = snapper.segments_remaining() <= self.heuristic.max_segments_left
            || snapper.remaining_meters() < self.heuristic.max_meters_to_end;
        if near_end && !self.finish_prompted {
            self.finish_prompted = true;
            let trip_id = trip.id.clone();

            debug!(
                "end of route near for {trip_id}: {} segment(s), {:.1}m left",
                snapper.segments_remaining(),
                snapper.remaining_meters()
            );
            self.emit(TripEvent::FinishPrompt { trip_id });
        }

        Ok(Some(snapped))
    }

    /// Marks the trip as winding down (e.g. after the driver accepted the
    /// finish prompt). Fix ingestion stops; [`finish`](Self::finish)
    /// completes the transition to Idle.
    pub fn begin_finishing(&mut self) -> Result<(), TripError> {
        match self.trip.as_mut() {
            Some(trip) if trip.state == TripState::Active => {
                trip.state = TripState::Finishing;
                Ok(())
            }
            _ => Err(TripError::NotActive),
        }
    }

    /// Ends the trip: `Active | Finishing -> Idle`.
    ///
    /// The remote finish is best-effort; a failure is logged and the local
    /// transition happens regardless, so a dead network cannot strand the
    /// driver mid-trip. The persisted position slot is cleared once the
    /// store acknowledged the finish (or there was no durable record to
    /// finish).
    pub fn finish(&mut self) -> Result<(), TripError> {
        let Some(trip) = self.trip.take() else {
            return Err(TripError::NotActive);
        };

        self.snapper = None;
        self.promotion = None;
        self.finish_prompted = false;

        let remote_done = if trip.is_provisional() {
            true
        } else {
            match self.trips.finish_trip(&trip.id) {
                Ok(()) => true,
                Err(err) => {
                    warn!("remote finish failed for {} ({err}); finishing locally", trip.id);
                    false
                }
            }
        };

        if remote_done {
            if let Err(err) = self.slot.clear() {
                warn!("clearing persisted position failed: {err}");
            }
        }

        info!("trip {} finished", trip.id);
        self.emit(TripEvent::Finished { trip_id: trip.id });
        Ok(())
    }

    /// Loads a route and rejects it if any vertex is out of coordinate
    /// range; the snapper assumes valid geometry.
    fn checked_route(&self, route_id: &str) -> Result<LineString, TripError> {
        let path = self.routes.load_route(route_id)?;
        for coord in &path.0 {
            checked_point(coord.y, coord.x).map_err(TripError::BadRoute)?;
        }

        Ok(path)
    }

    fn emit(&mut self, event: TripEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}
