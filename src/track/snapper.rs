use geo::{Distance, Haversine, LineString, Point};
use log::trace;

use crate::geo::{nearest_index, project_onto_segment, Projection};
use crate::track::cursor::SnapCursor;
use crate::track::fix::{RawFix, SnappedFix};

/// Fixes further than this from any candidate segment are treated as
/// outliers and held at the previous snapped position.
pub const DEFAULT_MAX_LATERAL_METERS: f64 = 20.0;

/// Segments considered behind the cursor when matching a fix.
const SEARCH_BEHIND: usize = 5;
/// Segments considered ahead of the cursor. Bounds the scan and keeps a
/// looped or self-intersecting route from matching arbitrarily far ahead.
const SEARCH_AHEAD: usize = 200;
/// Past this fraction of a segment the cursor rolls over to the next one.
const ADVANCE_THRESHOLD: f64 = 0.95;

/// Projects a raw GPS stream onto a fixed route polyline.
///
/// Owns the densified path and the forward-only [`SnapCursor`] for one
/// trip. Exactly one snapper instance writes a given cursor.
///
/// ### Example
///
/// ```rust
/// use geo::wkt;
/// use rastro::geo::densify;
/// use rastro::track::{RawFix, Snapper};
///
/// let route = wkt! { LINESTRING (-77.02 3.88, -77.01 3.88) };
/// let mut snapper = Snapper::new(densify(&route, 5.0));
///
/// // A fix slightly off the road is pulled back onto it.
/// let fix = RawFix::new(3.8801, -77.018, Some(6.1), 1_000);
/// let snapped = snapper.snap(&fix);
/// assert_eq!(snapped.lat, 3.88);
/// ```
#[derive(Clone, Debug)]
pub struct Snapper {
    path: LineString,
    cursor: SnapCursor,
    max_lateral_meters: f64,
}

impl Snapper {
    /// Creates a snapper over an already-densified path.
    ///
    /// Paths with fewer than 2 points disable snapping entirely: every
    /// raw fix passes through unchanged and no outlier guard is active.
    pub fn new(path: LineString) -> Self {
        Snapper {
            path,
            cursor: SnapCursor::new(),
            max_lateral_meters: DEFAULT_MAX_LATERAL_METERS,
        }
    }

    pub fn with_max_lateral(mut self, meters: f64) -> Self {
        self.max_lateral_meters = meters;
        self
    }

    pub fn cursor(&self) -> &SnapCursor {
        &self.cursor
    }

    pub fn path(&self) -> &LineString {
        &self.path
    }

    /// Seeds the cursor near `last_known`, one segment short of the
    /// nearest vertex, so a resumed trip can move forward immediately
    /// without re-walking the route from its start.
    pub fn resume_near(&mut self, last_known: Point) {
        if self.snapping_enabled() {
            let index = nearest_index(&last_known, &self.path);
            self.cursor = SnapCursor::resumed_at(index, last_known);
        }
    }

    /// Snaps one raw fix onto the path.
    ///
    /// The returned fix is one of: the best in-window projection, the held
    /// previous position (lateral outlier), or the raw fix verbatim when
    /// the path is too short for snapping.
    pub fn snap(&mut self, raw: &RawFix) -> SnappedFix {
        if !self.snapping_enabled() {
            return SnappedFix::at(raw.point(), raw);
        }

        let point = raw.point();
        let last_segment = self.last_segment();

        let from = self.cursor.segment.saturating_sub(SEARCH_BEHIND);
        let to = (self.cursor.segment + SEARCH_AHEAD).min(last_segment);

        let mut best: Option<(usize, Projection)> = None;
        for segment in from..=to {
            let a = Point::from(self.path.0[segment]);
            let b = Point::from(self.path.0[segment + 1]);

            let projection = project_onto_segment(&point, &a, &b);
            if best
                .as_ref()
                .map_or(true, |(_, held)| projection.distance < held.distance)
            {
                best = Some((segment, projection));
            }
        }

        let Some((mut segment, mut projection)) = best else {
            // Window was empty; hold position if we have one.
            return match self.cursor.last_snapped {
                Some(held) => SnappedFix::at(held, raw),
                None => SnappedFix::at(point, raw),
            };
        };

        // Lateral outlier guard: hold the previous position rather than
        // publishing the jump.
        if projection.distance > self.max_lateral_meters {
            if let Some(held) = self.cursor.last_snapped {
                trace!(
                    "fix {:.1}m off-route (limit {:.1}m), holding position",
                    projection.distance,
                    self.max_lateral_meters
                );
                return SnappedFix::at(held, raw);
            }
        }

        // Forward-only: a match behind the cursor clamps to the cursor's
        // segment start, and the cursor does not move.
        if segment < self.cursor.segment {
            segment = self.cursor.segment;
            projection = Projection {
                point: Point::from(self.path.0[segment]),
                t: 0.0,
                distance: Haversine.distance(point, Point::from(self.path.0[segment])),
            };
        }

        self.cursor.segment = if projection.t > ADVANCE_THRESHOLD {
            (segment + 1).min(last_segment)
        } else {
            self.cursor.segment.max(segment)
        };
        self.cursor.last_snapped = Some(projection.point);

        SnappedFix::at(projection.point, raw)
    }

    /// Straight-line meters from the last snapped position (or, before any
    /// snap, the cursor's segment start) to the end of the path.
    pub fn remaining_meters(&self) -> f64 {
        if !self.snapping_enabled() {
            return f64::INFINITY;
        }

        let here = self
            .cursor
            .last_snapped
            .unwrap_or_else(|| Point::from(self.path.0[self.cursor.segment]));
        let end = Point::from(self.path.0[self.path.0.len() - 1]);

        Haversine.distance(here, end)
    }

    /// Segments between the cursor and the end of the path.
    pub fn segments_remaining(&self) -> usize {
        if !self.snapping_enabled() {
            return usize::MAX;
        }

        self.last_segment() - self.cursor.segment
    }

    fn snapping_enabled(&self) -> bool {
        self.path.0.len() >= 2
    }

    /// Index of the final segment: `len - 2`, as segment `i` spans
    /// vertices `i` and `i + 1`.
    fn last_segment(&self) -> usize {
        self.path.0.len() - 2
    }
}
