use geo::Point;

/// Progress marker over a densified path.
///
/// `segment` is the index of the segment the vehicle was last matched to.
/// It never decreases for the lifetime of a trip; the snapper enforces
/// that invariant, this struct only records it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SnapCursor {
    pub segment: usize,
    pub last_snapped: Option<Point>,
}

impl SnapCursor {
    pub fn new() -> Self {
        SnapCursor::default()
    }

    /// A cursor seeded mid-path, with one segment of slack behind `segment`
    /// so immediate forward motion is matched without re-walking the path
    /// from its start.
    pub fn resumed_at(segment: usize, last_known: Point) -> Self {
        SnapCursor {
            segment: segment.saturating_sub(1),
            last_snapped: Some(last_known),
        }
    }
}
