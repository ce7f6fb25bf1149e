use geo::{LineString, Point};

use crate::geo::project_onto_segment;

/// Shortest animation a sighting may produce, in ms.
pub const MIN_ANIMATION_MS: i64 = 300;
/// Longest animation a sighting may produce, in ms.
pub const MAX_ANIMATION_MS: i64 = 8_000;

/// Segments scanned around the route cursor when constraining a marker
/// to its route geometry.
const ROUTE_WINDOW: usize = 50;

/// A time-boxed linear interpolation between two observed positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Animation {
    pub from: Point,
    pub to: Point,
    pub start_ms: i64,
    pub duration_ms: i64,
}

impl Animation {
    pub fn position_at(&self, now_ms: i64) -> Point {
        let elapsed = (now_ms - self.start_ms).max(0);
        if elapsed >= self.duration_ms {
            return self.to;
        }

        let t = elapsed as f64 / self.duration_ms as f64;
        Point::new(
            self.from.x() + t * (self.to.x() - self.from.x()),
            self.from.y() + t * (self.to.y() - self.from.y()),
        )
    }

    pub fn done(&self, now_ms: i64) -> bool {
        now_ms - self.start_ms >= self.duration_ms
    }
}

/// One remotely observed trip: its marker, the trail of sighted points,
/// and the in-flight animation, if any.
///
/// Created on first sighting, torn down when the trip is reported
/// finished. Display is monotone: a fresh sighting mid-animation restarts
/// from wherever the marker currently is, it never warps back to a stale
/// `from`.
#[derive(Clone, Debug)]
pub struct RemoteTripView {
    pub trip_id: String,
    marker: Point,
    trail: Vec<Point>,
    pending: Option<Animation>,
    route: Option<LineString>,
    route_cursor: usize,
    last_sample_ms: i64,
}

impl RemoteTripView {
    /// First sighting: the marker lands on the point, no animation.
    pub fn new(trip_id: &str, point: Point, sample_ms: i64) -> Self {
        RemoteTripView {
            trip_id: trip_id.to_string(),
            marker: point,
            trail: vec![point],
            pending: None,
            route: None,
            route_cursor: 0,
            last_sample_ms: sample_ms,
        }
    }

    /// Attaches route geometry; subsequent interpolated positions are
    /// pulled onto the nearest route segment instead of cutting corners
    /// on the chord.
    pub fn set_route(&mut self, route: LineString) {
        self.route_cursor = 0;
        self.route = Some(route);
    }

    pub fn marker(&self) -> Point {
        self.marker
    }

    pub fn trail(&self) -> &[Point] {
        &self.trail
    }

    pub fn animating(&self) -> bool {
        self.pending.is_some()
    }

    /// A later sighting: animate from the marker's current position to
    /// `to` over the sample-time delta, clamped to
    /// [[`MIN_ANIMATION_MS`], [`MAX_ANIMATION_MS`]]. Cancels any in-flight
    /// animation.
    pub fn observe(&mut self, to: Point, sample_ms: i64, now_ms: i64) {
        let from = self.position_at(now_ms);

        let duration = (sample_ms - self.last_sample_ms).clamp(MIN_ANIMATION_MS, MAX_ANIMATION_MS);
        self.last_sample_ms = sample_ms;
        self.trail.push(to);

        self.pending = Some(Animation {
            from,
            to,
            start_ms: now_ms,
            duration_ms: duration,
        });
    }

    /// Advances the animation and returns the marker position for
    /// `now_ms`. Settles at the animation target once it completes.
    pub fn tick(&mut self, now_ms: i64) -> Point {
        let position = self.position_at(now_ms);

        if self.pending.is_some_and(|animation| animation.done(now_ms)) {
            self.pending = None;
        }

        self.marker = position;
        position
    }

    fn position_at(&mut self, now_ms: i64) -> Point {
        let chord = match &self.pending {
            Some(animation) => animation.position_at(now_ms),
            None => self.marker,
        };

        self.constrain_to_route(chord)
    }

    /// Projects `point` onto the nearest route segment within a window of
    /// the last matched segment. Without route geometry this is identity.
    fn constrain_to_route(&mut self, point: Point) -> Point {
        let Some(route) = &self.route else {
            return point;
        };
        if route.0.len() < 2 {
            return point;
        }

        let last_segment = route.0.len() - 2;
        let from = self.route_cursor.saturating_sub(ROUTE_WINDOW / 10);
        let to = (self.route_cursor + ROUTE_WINDOW).min(last_segment);

        let mut best: Option<(usize, Point, f64)> = None;
        for segment in from..=to {
            let a = Point::from(route.0[segment]);
            let b = Point::from(route.0[segment + 1]);

            let projection = project_onto_segment(&point, &a, &b);
            if best
                .as_ref()
                .map_or(true, |(_, _, held)| projection.distance < *held)
            {
                best = Some((segment, projection.point, projection.distance));
            }
        }

        match best {
            Some((segment, projected, _)) => {
                self.route_cursor = segment;
                projected
            }
            None => point,
        }
    }
}
