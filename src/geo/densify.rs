use geo::{Coord, LineString};

use crate::geo::project::planar_meters;

/// Resamples `path` so that no two consecutive vertices are further apart
/// than `max_step_meters`, inserting evenly spaced intermediate points on
/// each over-long segment. Original vertices, the endpoints included, are
/// preserved exactly.
///
/// Degenerate input (fewer than 2 points, or a non-positive step) is
/// returned unchanged.
pub fn densify(path: &LineString, max_step_meters: f64) -> LineString {
    if path.0.len() < 2 || max_step_meters <= 0.0 {
        return path.clone();
    }

    let mut coords: Vec<Coord> = Vec::with_capacity(path.0.len());
    coords.push(path.0[0]);

    for line in path.lines() {
        let length = planar_meters(&line.start_point(), &line.end_point());
        let pieces = (length / max_step_meters).ceil().max(1.0) as usize;

        for piece in 1..=pieces {
            if piece == pieces {
                // Take the original vertex, not an interpolation of it.
                coords.push(line.end);
            } else {
                let t = piece as f64 / pieces as f64;
                coords.push(Coord {
                    x: line.start.x + t * (line.end.x - line.start.x),
                    y: line.start.y + t * (line.end.y - line.start.y),
                });
            }
        }
    }

    LineString::new(coords)
}
