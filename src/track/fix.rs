use geo::Point;
use serde::{Deserialize, Serialize};

/// Speed reported downstream when the source has none, in m/s.
///
/// Collection vehicles crawl; 5 m/s (18 km/h) is a serviceable stand-in
/// when the receiver omits or garbles the speed channel.
pub const FALLBACK_SPEED_MPS: f64 = 5.0;

/// One GPS sample as delivered by the provider, unsnapped.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawFix {
    pub lat: f64,
    pub lng: f64,
    pub speed_mps: Option<f64>,
    pub timestamp_ms: i64,
}

impl RawFix {
    pub fn new(lat: f64, lng: f64, speed_mps: Option<f64>, timestamp_ms: i64) -> Self {
        RawFix {
            lat,
            lng,
            speed_mps,
            timestamp_ms,
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.lng, self.lat)
    }

    /// The reported speed, or [`FALLBACK_SPEED_MPS`] when the source gave
    /// none or gave a non-finite value.
    pub fn speed_or_fallback(&self) -> f64 {
        match self.speed_mps {
            Some(speed) if speed.is_finite() => speed,
            _ => FALLBACK_SPEED_MPS,
        }
    }
}

/// A fix after projection onto the route geometry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnappedFix {
    pub lat: f64,
    pub lng: f64,
    pub speed_mps: f64,
    pub timestamp_ms: i64,
}

impl SnappedFix {
    pub fn at(point: Point, raw: &RawFix) -> Self {
        SnappedFix {
            lat: point.y(),
            lng: point.x(),
            speed_mps: raw.speed_or_fallback(),
            timestamp_ms: raw.timestamp_ms,
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.lng, self.lat)
    }
}
