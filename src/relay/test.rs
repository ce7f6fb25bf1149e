use approx::assert_relative_eq;
use geo::{wkt, Point};

use super::*;
use crate::store::{TripAction, TripRecord, TripSignal};

#[test]
fn first_sighting_places_marker_without_animation() {
    let mut relay = Relay::new();

    relay.observe("trip-1", Point::new(-77.02, 3.88), 1_000, 1_000);

    let view = relay.view("trip-1").unwrap();
    assert_eq!(view.marker(), Point::new(-77.02, 3.88));
    assert!(!view.animating());
}

#[test]
fn second_sighting_interpolates_between_samples() {
    let mut relay = Relay::new();

    relay.observe("trip-1", Point::new(0.0, 0.0), 0, 10_000);
    // Samples 2s apart: a 2s animation.
    relay.observe("trip-1", Point::new(0.001, 0.0), 2_000, 10_000);

    let halfway = relay.tick(11_000);
    let (_, marker) = halfway.iter().find(|(id, _)| id == "trip-1").unwrap();
    assert_relative_eq!(marker.x(), 0.0005, max_relative = 1e-9);

    let settled = relay.tick(12_100);
    let (_, marker) = settled.iter().find(|(id, _)| id == "trip-1").unwrap();
    assert_relative_eq!(marker.x(), 0.001);
    assert!(!relay.view("trip-1").unwrap().animating());
}

#[test]
fn animation_duration_is_clamped() {
    let mut relay = Relay::new();

    relay.observe("trip-1", Point::new(0.0, 0.0), 0, 0);
    // 60s between samples clamps to 8s of animation.
    relay.observe("trip-1", Point::new(0.001, 0.0), 60_000, 0);

    relay.tick(7_999);
    assert!(relay.view("trip-1").unwrap().animating());
    relay.tick(8_000);
    assert!(!relay.view("trip-1").unwrap().animating());

    // Samples 50ms apart clamp up to 300ms.
    relay.observe("trip-1", Point::new(0.002, 0.0), 60_050, 8_000);
    relay.tick(8_299);
    assert!(relay.view("trip-1").unwrap().animating());
    relay.tick(8_301);
    assert!(!relay.view("trip-1").unwrap().animating());
}

#[test]
fn mid_flight_sighting_restarts_from_current_position() {
    let mut relay = Relay::new();

    relay.observe("trip-1", Point::new(0.0, 0.0), 0, 0);
    relay.observe("trip-1", Point::new(0.001, 0.0), 2_000, 0);

    // Halfway through, a new sighting arrives.
    relay.tick(1_000);
    relay.observe("trip-1", Point::new(0.002, 0.0), 4_000, 1_000);

    // The new animation starts at the interpolated midpoint, not at 0.
    let positions = relay.tick(1_000);
    let (_, marker) = positions.iter().find(|(id, _)| id == "trip-1").unwrap();
    assert_relative_eq!(marker.x(), 0.0005, max_relative = 1e-9);
}

#[test]
fn route_constrained_marker_stays_on_route() {
    let mut relay = Relay::new();
    relay.set_route("trip-1", wkt! { LINESTRING (0.0 0.0, 0.001 0.0, 0.002 0.0) });

    // Sightings slightly north of the route.
    relay.observe("trip-1", Point::new(0.0, 0.00005), 0, 0);
    relay.observe("trip-1", Point::new(0.001, 0.00005), 2_000, 0);

    let positions = relay.tick(1_000);
    let (_, marker) = positions.iter().find(|(id, _)| id == "trip-1").unwrap();
    assert_relative_eq!(marker.y(), 0.0, epsilon = 1e-12);
}

#[test]
fn finish_signal_tears_the_view_down() {
    let mut relay = Relay::new();

    relay.observe("trip-1", Point::new(0.0, 0.0), 0, 0);
    relay.observe("trip-1", Point::new(0.001, 0.0), 2_000, 0);
    assert_eq!(relay.len(), 1);

    relay.apply_signal(&TripSignal {
        action: TripAction::Finish,
        trip_id: "trip-1".into(),
        record: None,
    });

    assert!(relay.is_empty());
    assert!(relay.view("trip-1").is_none());
}

#[test]
fn start_signal_is_a_no_op_until_first_position() {
    let mut relay = Relay::new();

    relay.apply_signal(&TripSignal {
        action: TripAction::Start,
        trip_id: "trip-1".into(),
        record: None,
    });

    assert!(relay.is_empty());
}

#[test]
fn reconcile_sweeps_finished_trips() {
    let mut relay = Relay::new();

    relay.observe("trip-1", Point::new(0.0, 0.0), 0, 0);
    relay.observe("trip-2", Point::new(0.001, 0.0), 0, 0);

    let records = vec![
        TripRecord {
            id: "trip-1".into(),
            route_id: "ruta-4".into(),
            vehicle_id: None,
            status: "finalizado".into(),
        },
        TripRecord {
            id: "trip-2".into(),
            route_id: "ruta-9".into(),
            vehicle_id: None,
            status: "en curso".into(),
        },
        // Never sighted; nothing to remove.
        TripRecord {
            id: "trip-3".into(),
            route_id: "ruta-1".into(),
            vehicle_id: None,
            status: "finalizado".into(),
        },
    ];

    relay.reconcile(&records);

    assert!(relay.view("trip-1").is_none());
    assert!(relay.view("trip-2").is_some());
    assert_eq!(relay.len(), 1);
}

#[test]
fn trail_accumulates_sightings() {
    let mut relay = Relay::new();

    relay.observe("trip-1", Point::new(0.0, 0.0), 0, 0);
    relay.observe("trip-1", Point::new(0.001, 0.0), 2_000, 0);
    relay.observe("trip-1", Point::new(0.002, 0.0), 4_000, 2_000);

    assert_eq!(relay.view("trip-1").unwrap().trail().len(), 3);
}
