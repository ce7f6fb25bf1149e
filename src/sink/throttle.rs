/// Minimum interval between durable (REST) position writes.
pub const DURABLE_INTERVAL_MS: i64 = 5_000;
/// Minimum interval between realtime-database and broadcast writes.
pub const REALTIME_INTERVAL_MS: i64 = 4_000;

/// Per-destination minimum-interval gate.
///
/// Purely time-based and local to this process; each write destination
/// gets its own gate so cadences can differ.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThrottleGate {
    pub min_interval_ms: i64,
    pub last_fire_at_ms: i64,
}

impl ThrottleGate {
    /// A gate that will fire on its first call.
    pub fn new(min_interval_ms: i64) -> Self {
        ThrottleGate {
            min_interval_ms,
            last_fire_at_ms: i64::MIN,
        }
    }

    /// Returns `true` and records `now_ms` iff at least `min_interval_ms`
    /// has elapsed since the last fire. Otherwise `false`, gate unchanged.
    pub fn maybe_fire(&mut self, now_ms: i64) -> bool {
        if now_ms.saturating_sub(self.last_fire_at_ms) >= self.min_interval_ms {
            self.last_fire_at_ms = now_ms;
            return true;
        }

        false
    }
}
