//! Observer-side replay: sightings for two trips arrive out of band,
//! markers animate between them, and a reconcile pass sweeps a trip
//! whose finish broadcast was "dropped".

use dotenv::dotenv;
use geo::{wkt, LineString, Point};
use wkt::ToWkt;

use rastro::relay::Relay;
use rastro::store::{TripAction, TripRecord, TripSignal};

fn main() {
    let _ = dotenv();
    env_logger::init();

    let mut relay = Relay::new();
    relay.set_route("trip-77", wkt! { LINESTRING (-77.02 3.88, -77.01 3.88) });

    // Interleaved sightings, two seconds apart per trip.
    relay.observe("trip-77", Point::new(-77.0195, 3.8803), 0, 0);
    relay.observe("trip-80", Point::new(-77.005, 3.891), 500, 500);
    relay.observe("trip-77", Point::new(-77.0175, 3.8798), 2_000, 2_000);
    relay.observe("trip-80", Point::new(-77.004, 3.8915), 2_500, 2_500);

    // Watch the markers move.
    for now in (2_000..=4_000).step_by(500) {
        for (trip, marker) in relay.tick(now) {
            println!("t={now}ms {trip}: ({:.5}, {:.5})", marker.y(), marker.x());
        }
    }

    if let Some(view) = relay.view("trip-77") {
        let trail: LineString = view.trail().iter().copied().collect();
        println!("trip-77 trail: {}", trail.wkt_string());
    }

    // trip-80 finishes via the lifecycle broadcast.
    relay.apply_signal(&TripSignal {
        action: TripAction::Finish,
        trip_id: "trip-80".into(),
        record: None,
    });
    println!("after finish signal: {} view(s)", relay.len());

    // trip-77's finish event was dropped; the status poll catches it.
    relay.reconcile(&[TripRecord {
        id: "trip-77".into(),
        route_id: "ruta-4".into(),
        vehicle_id: None,
        status: "finalizado".into(),
    }]);
    println!("after reconcile: {} view(s)", relay.len());
}
