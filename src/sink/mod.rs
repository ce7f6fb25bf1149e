//! Throttled fan-out of snapped fixes to the write destinations.
//!
//! Three destinations, three independent [`ThrottleGate`]s. Writes are
//! best-effort and at-most-once per interval: a failing destination is
//! logged and skipped, the others still fire, and nothing is retried
//! before the next natural interval.

use std::sync::Arc;

use log::{debug, warn};

use crate::store::{
    BroadcastChannel, PositionBroadcast, PositionInsert, PositionStore, RealtimeStore,
    POSITION_CHANNEL,
};
use crate::track::SnappedFix;
use crate::trip::PROVISIONAL_PREFIX;

#[doc(hidden)]
pub mod throttle;
#[cfg(test)]
mod test;

#[doc(inline)]
pub use throttle::{ThrottleGate, DURABLE_INTERVAL_MS, REALTIME_INTERVAL_MS};

pub struct PositionSink {
    durable: Arc<dyn PositionStore>,
    realtime: Arc<dyn RealtimeStore>,
    broadcast: Arc<dyn BroadcastChannel>,

    durable_gate: ThrottleGate,
    realtime_gate: ThrottleGate,
    broadcast_gate: ThrottleGate,

    channel: &'static str,
}

impl PositionSink {
    pub fn new(
        durable: Arc<dyn PositionStore>,
        realtime: Arc<dyn RealtimeStore>,
        broadcast: Arc<dyn BroadcastChannel>,
    ) -> Self {
        PositionSink {
            durable,
            realtime,
            broadcast,
            durable_gate: ThrottleGate::new(DURABLE_INTERVAL_MS),
            realtime_gate: ThrottleGate::new(REALTIME_INTERVAL_MS),
            broadcast_gate: ThrottleGate::new(REALTIME_INTERVAL_MS),
            channel: POSITION_CHANNEL,
        }
    }

    /// Offers one snapped fix to every destination, each behind its own
    /// gate. Durable writes are skipped while `trip_id` is provisional;
    /// trips that never promote run realtime/broadcast only.
    pub fn offer(&mut self, trip_id: &str, route_id: &str, fix: &SnappedFix, now_ms: i64) {
        let provisional = trip_id.starts_with(PROVISIONAL_PREFIX);

        if !provisional && self.durable_gate.maybe_fire(now_ms) {
            if let Err(err) = self
                .durable
                .append_position(trip_id, fix.lat, fix.lng, fix.speed_mps)
            {
                warn!("durable position write failed for {trip_id}: {err}");
            }
        }

        if self.realtime_gate.maybe_fire(now_ms) {
            let row = PositionInsert {
                trip_id: trip_id.to_string(),
                route_id: route_id.to_string(),
                lat: fix.lat,
                lng: fix.lng,
                speed: fix.speed_mps,
            };

            if let Err(err) = self.realtime.insert_position(&row) {
                warn!("realtime position insert failed for {trip_id}: {err}");
            }
        }

        if self.broadcast_gate.maybe_fire(now_ms) {
            debug!("broadcasting position for {trip_id} on {}", self.channel);
            self.broadcast.publish(
                self.channel,
                &PositionBroadcast {
                    trip_id: trip_id.to_string(),
                    route_id: route_id.to_string(),
                    lat: fix.lat,
                    lng: fix.lng,
                },
            );
        }
    }

    /// Re-arms every gate so the next offer fires immediately, whatever
    /// the clock says. Used when a trip starts or resumes.
    pub fn reset(&mut self) {
        self.durable_gate = ThrottleGate::new(self.durable_gate.min_interval_ms);
        self.realtime_gate = ThrottleGate::new(self.realtime_gate.min_interval_ms);
        self.broadcast_gate = ThrottleGate::new(self.broadcast_gate.min_interval_ms);
    }
}
