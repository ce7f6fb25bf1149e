use std::sync::Arc;

use super::*;
use crate::store::memory::{MemoryBroadcast, MemoryPositionStore, MemoryRealtimeStore};
use crate::track::SnappedFix;

fn fix(timestamp_ms: i64) -> SnappedFix {
    SnappedFix {
        lat: 3.88,
        lng: -77.02,
        speed_mps: 4.2,
        timestamp_ms,
    }
}

fn sink_with_stores() -> (
    PositionSink,
    Arc<MemoryPositionStore>,
    Arc<MemoryRealtimeStore>,
    Arc<MemoryBroadcast>,
) {
    let durable = Arc::new(MemoryPositionStore::new());
    let realtime = Arc::new(MemoryRealtimeStore::new());
    let broadcast = Arc::new(MemoryBroadcast::new());

    let sink = PositionSink::new(durable.clone(), realtime.clone(), broadcast.clone());
    (sink, durable, realtime, broadcast)
}

#[test]
fn gate_respects_minimum_interval() {
    let mut gate = ThrottleGate {
        min_interval_ms: 5_000,
        last_fire_at_ms: 1_000,
    };

    assert!(!gate.maybe_fire(4_000));
    assert_eq!(gate.last_fire_at_ms, 1_000);

    assert!(gate.maybe_fire(6_500));
    assert_eq!(gate.last_fire_at_ms, 6_500);
}

#[test]
fn gate_fires_at_most_once_per_interval() {
    let mut gate = ThrottleGate::new(5_000);

    assert!(gate.maybe_fire(10_000));
    assert!(!gate.maybe_fire(10_001));
    assert!(!gate.maybe_fire(14_999));
    assert!(gate.maybe_fire(15_000));
}

#[test]
fn fresh_gate_fires_immediately() {
    let mut gate = ThrottleGate::new(5_000);
    assert!(gate.maybe_fire(0));
}

#[test]
fn destinations_throttle_independently() {
    let (mut sink, durable, realtime, broadcast) = sink_with_stores();

    // First offer gets through everywhere.
    sink.offer("trip-1", "ruta-4", &fix(0), 0);
    // 4.5s later: realtime/broadcast (4s) fire again, durable (5s) holds.
    sink.offer("trip-1", "ruta-4", &fix(4_500), 4_500);

    assert_eq!(durable.rows().len(), 1);
    assert_eq!(realtime.rows().len(), 2);
    assert_eq!(broadcast.messages().len(), 2);

    // 5.5s in: durable now fires too.
    sink.offer("trip-1", "ruta-4", &fix(5_500), 5_500);
    assert_eq!(durable.rows().len(), 2);
}

#[test]
fn provisional_trips_skip_durable_writes() {
    let (mut sink, durable, realtime, broadcast) = sink_with_stores();

    sink.offer("local-1714", "ruta-4", &fix(0), 0);

    assert!(durable.rows().is_empty());
    assert_eq!(realtime.rows().len(), 1);
    assert_eq!(broadcast.messages().len(), 1);
    assert_eq!(realtime.rows()[0].trip_id, "local-1714");
}

#[test]
fn failed_destination_does_not_block_the_others() {
    let (mut sink, durable, realtime, broadcast) = sink_with_stores();
    durable.fail_appends(true);

    sink.offer("trip-1", "ruta-4", &fix(0), 0);

    assert!(durable.rows().is_empty());
    assert_eq!(realtime.rows().len(), 1);
    assert_eq!(broadcast.messages().len(), 1);

    // At-most-once: the failed write is not retried inside the interval.
    sink.offer("trip-1", "ruta-4", &fix(1_000), 1_000);
    assert!(durable.rows().is_empty());
    assert_eq!(realtime.rows().len(), 1);
}

#[test]
fn reset_rearms_all_gates() {
    let (mut sink, durable, realtime, _) = sink_with_stores();

    sink.offer("trip-1", "ruta-4", &fix(0), 0);
    sink.reset();
    sink.offer("trip-1", "ruta-4", &fix(100), 100);

    assert_eq!(durable.rows().len(), 2);
    assert_eq!(realtime.rows().len(), 2);
}
