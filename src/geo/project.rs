use geo::{Distance, Haversine, LineString, Point};
use itertools::Itertools;

use crate::geo::error::GeoError;
use crate::geo::METERS_PER_DEGREE;

/// Result of projecting a point onto a single path segment.
///
/// `t` is the normalised position of the projection along the segment,
/// clamped to `[0, 1]`; `distance` is the great-circle distance in meters
/// between the query point and the projected point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub point: Point,
    pub t: f64,
    pub distance: f64,
}

/// Constructs a [`Point`] from a `lat`/`lng` pair, validating both are
/// within range. Points are stored `(x = lng, y = lat)` as [`geo`] expects.
pub fn checked_point(lat: f64, lng: f64) -> Result<Point, GeoError> {
    if !(-90f64..=90f64).contains(&lat) {
        return Err(GeoError::InvalidCoordinate(format!(
            "Latitude must be within [-90, 90]. Given: {lat}"
        )));
    }

    if !(-180f64..=180f64).contains(&lng) {
        return Err(GeoError::InvalidCoordinate(format!(
            "Longitude must be within [-180, 180]. Given: {lng}"
        )));
    }

    Ok(Point::new(lng, lat))
}

/// Projects `p` onto the segment `[a, b]`.
///
/// Works on a local planar approximation: longitudes are scaled by
/// `cos(lat)` so a degree of x and a degree of y span comparable meters,
/// the projection happens in that plane, and the result is mapped back to
/// lat/lng. Valid at metro scale; not valid near the poles or across the
/// antimeridian.
pub fn project_onto_segment(p: &Point, a: &Point, b: &Point) -> Projection {
    let scale = p.y().to_radians().cos();

    // Segment and point vectors in the scaled plane, relative to `a`.
    let sx = (b.x() - a.x()) * scale;
    let sy = b.y() - a.y();
    let px = (p.x() - a.x()) * scale;
    let py = p.y() - a.y();

    let len2 = sx * sx + sy * sy;

    // Zero-length segment: the projection is `a` itself.
    let t = if len2 > f64::EPSILON {
        ((px * sx + py * sy) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let point = Point::new(a.x() + t * (b.x() - a.x()), a.y() + t * (b.y() - a.y()));

    Projection {
        point,
        t,
        distance: Haversine.distance(*p, point),
    }
}

/// Index of the path vertex closest to `point`. Linear scan; paths stay
/// in the low thousands of vertices after densification, so O(n) holds up.
pub fn nearest_index(point: &Point, path: &LineString) -> usize {
    path.points()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            Haversine
                .distance(*point, *a)
                .total_cmp(&Haversine.distance(*point, *b))
        })
        .map(|(index, _)| index)
        .unwrap_or(0)
}

/// Cumulative great-circle length of a path in meters.
pub fn path_length(path: &LineString) -> f64 {
    path.points()
        .tuple_windows()
        .fold(0.0, |length, (a, b)| length + Haversine.distance(a, b))
}

/// Straight-line spacing estimate used by [`densify`](crate::geo::densify):
/// meters between two points under the same planar approximation as
/// [`project_onto_segment`].
pub(crate) fn planar_meters(a: &Point, b: &Point) -> f64 {
    let scale = a.y().to_radians().cos();
    let dx = (b.x() - a.x()) * scale * METERS_PER_DEGREE;
    let dy = (b.y() - a.y()) * METERS_PER_DEGREE;

    (dx * dx + dy * dy).sqrt()
}
