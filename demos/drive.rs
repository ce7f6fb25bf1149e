//! Simulated driver session: start a trip, stream GPS samples through
//! the watch into the snapper and sink, poll for promotion, finish.
//!
//! The trip store is told to fail creation so the provisional-id /
//! promotion path is visible in the logs.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dotenv::dotenv;
use geo::wkt;

use rastro::sched;
use rastro::sink::PositionSink;
use rastro::store::memory::{
    MemoryBroadcast, MemoryPositionStore, MemoryRealtimeStore, MemoryRouteStore, MemorySlot,
    MemoryTripStore, ScriptedGps,
};
use rastro::store::TripRecord;
use rastro::track::RawFix;
use rastro::trip::{TripSession, TripTracker, PROMOTION_INTERVAL_MS, PROMOTION_MAX_ATTEMPTS};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _ = dotenv();
    env_logger::init();

    let routes = Arc::new(MemoryRouteStore::new());
    routes.insert(
        "ruta-4",
        wkt! { LINESTRING (-77.02 3.88, -77.015 3.883, -77.012 3.889, -77.003 3.891) },
    );

    let trips = Arc::new(MemoryTripStore::new());
    trips.fail_creates(true);

    let durable = Arc::new(MemoryPositionStore::new());
    let realtime = Arc::new(MemoryRealtimeStore::new());
    let broadcast = Arc::new(MemoryBroadcast::new());

    let sink = PositionSink::new(durable.clone(), realtime.clone(), broadcast.clone());

    let mut tracker = TripTracker::new(routes, trips.clone(), Arc::new(MemorySlot::new()), sink);
    tracker.on_event(Box::new(|event| println!("event: {event:?}")));

    // The scripted route drive: samples roughly every second, wobbling
    // off-axis, delivered through the GPS watch like the device would.
    let waypoints = [
        (3.8801, -77.0199),
        (3.8808, -77.0192),
        (3.8815, -77.0185),
        (3.8824, -77.0176),
        (3.8831, -77.0168),
        (3.8840, -77.0158),
        (3.8852, -77.0148),
        (3.8866, -77.0138),
        (3.8880, -77.0128),
        (3.8893, -77.0115),
        (3.8900, -77.0095),
        (3.8906, -77.0070),
        (3.8909, -77.0045),
        (3.8910, -77.0031),
    ];
    let epoch = Utc::now().timestamp_millis();
    let gps = Arc::new(ScriptedGps::new(waypoints.iter().enumerate().map(
        |(i, (lat, lng))| RawFix::new(*lat, *lng, Some(6.5), epoch + i as i64 * 1_000),
    )));

    let mut session = TripSession::new(tracker, gps.clone());
    session.start("ruta-4", Some("veh-2")).expect("trip start");

    // Promotion polling, bounded exactly like a real session would run it.
    let poller = {
        let tracker = session.tracker();
        sched::repeat_limited(
            Duration::from_millis(PROMOTION_INTERVAL_MS),
            PROMOTION_MAX_ATTEMPTS,
            move || tracker.lock().unwrap().promotion_tick(),
        )
    };

    // A few seconds in, the backend "notices" the run.
    {
        let trips = trips.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            trips.seed(TripRecord {
                id: "trip-77".into(),
                route_id: "ruta-4".into(),
                vehicle_id: Some("veh-2".into()),
                status: "en curso".into(),
            });
        });
    }

    let tracker = session.tracker();
    while gps.emit() {
        if let Some(snapped) = tracker
            .lock()
            .unwrap()
            .trip()
            .and_then(|trip| trip.last_persisted_fix)
        {
            println!("snapped to ({:.4}, {:.4})", snapped.lat, snapped.lng);
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    poller.cancel();
    session.finish().expect("trip finish");

    println!(
        "durable rows: {}, realtime rows: {}, broadcasts: {}",
        durable.rows().len(),
        realtime.rows().len(),
        broadcast.messages().len()
    );
}
