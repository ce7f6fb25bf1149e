use approx::assert_relative_eq;
use geo::{wkt, Distance, Haversine, Point};

use super::*;

#[test]
fn densify_short_equator_run() {
    // ~111m along the equator.
    let path = wkt! { LINESTRING (0.0 0.0, 0.001 0.0) };
    let dense = densify(&path, 5.0);

    assert!(dense.0.len() >= 20, "got {} points", dense.0.len());
    assert_eq!(dense.0.first(), path.0.first());
    assert_eq!(dense.0.last(), path.0.last());
}

#[test]
fn densify_upper_bound() {
    let path = wkt! {
        LINESTRING (-77.02 3.88, -77.015 3.883, -77.012 3.889, -77.003 3.891)
    };

    let step = 5.0;
    let dense = densify(&path, step);

    for line in dense.lines() {
        let spacing = Haversine.distance(line.start_point(), line.end_point());
        // Small tolerance for the planar spacing estimate.
        assert!(spacing <= step * 1.01, "spacing {spacing} exceeds step");
    }
}

#[test]
fn densify_degenerate_passthrough() {
    let single = geo::LineString::new(vec![geo::Coord { x: -77.02, y: 3.88 }]);
    assert_eq!(densify(&single, 5.0), single);

    let pair = wkt! { LINESTRING (0.0 0.0, 0.001 0.0) };
    assert_eq!(densify(&pair, 0.0), pair);
}

#[test]
fn densify_preserves_original_vertices() {
    let path = wkt! { LINESTRING (-77.02 3.88, -77.01 3.885, -77.0 3.89) };
    let dense = densify(&path, 25.0);

    for coord in &path.0 {
        assert!(dense.0.contains(coord));
    }
}

#[test]
fn projection_midpoint() {
    // Query point abeam the middle of a west-east segment.
    let a = Point::new(-77.02, 3.88);
    let b = Point::new(-77.01, 3.88);
    let p = Point::new(-77.015, 3.8805);

    let projection = project_onto_segment(&p, &a, &b);

    assert_relative_eq!(projection.t, 0.5, max_relative = 1e-6);
    assert_relative_eq!(projection.point.x(), -77.015, max_relative = 1e-9);
    assert_relative_eq!(projection.point.y(), 3.88, max_relative = 1e-9);

    // ~55m of lateral offset.
    assert_relative_eq!(projection.distance, 55.6, max_relative = 0.01);
}

#[test]
fn projection_clamps_to_endpoints() {
    let a = Point::new(-77.02, 3.88);
    let b = Point::new(-77.01, 3.88);

    let before = project_onto_segment(&Point::new(-77.03, 3.88), &a, &b);
    assert_relative_eq!(before.t, 0.0);
    assert_eq!(before.point, a);

    let after = project_onto_segment(&Point::new(-77.0, 3.88), &a, &b);
    assert_relative_eq!(after.t, 1.0);
    assert_eq!(after.point, b);
}

#[test]
fn projection_zero_length_segment() {
    let a = Point::new(-77.02, 3.88);
    let p = Point::new(-77.019, 3.881);

    let projection = project_onto_segment(&p, &a, &a);
    assert_eq!(projection.point, a);
    assert_relative_eq!(projection.t, 0.0);
}

#[test]
fn planar_distance_stays_metro_scale() {
    // The planar estimate should agree with the haversine ground truth
    // to well under 1% over a few km at the service's latitude.
    let a = Point::new(-77.04, 3.87);
    let b = Point::new(-77.02, 3.89);

    let truth = Haversine.distance(a, b);
    assert_relative_eq!(super::project::planar_meters(&a, &b), truth, max_relative = 0.01);
}

#[test]
fn nearest_index_scans_whole_path() {
    let path = wkt! {
        LINESTRING (-77.02 3.88, -77.015 3.883, -77.012 3.889, -77.003 3.891)
    };

    let near_third = Point::new(-77.0125, 3.889);
    assert_eq!(nearest_index(&near_third, &path), 2);

    let near_first = Point::new(-77.021, 3.8799);
    assert_eq!(nearest_index(&near_first, &path), 0);
}

#[test]
fn path_length_accumulates() {
    // Two ~111m legs.
    let path = wkt! { LINESTRING (0.0 0.0, 0.001 0.0, 0.002 0.0) };
    assert_relative_eq!(path_length(&path), 222.4, max_relative = 0.01);
}

#[test]
fn checked_point_rejects_out_of_range() {
    assert!(checked_point(3.88, -77.02).is_ok());
    assert!(checked_point(91.0, 0.0).is_err());
    assert!(checked_point(0.0, -181.0).is_err());
}
