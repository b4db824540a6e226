use crate::region::{Rect, RegionId};

/// A notification that the visibility of a watched region changed.
///
/// Produced by an [`IntersectionService`](crate::observer::IntersectionService)
/// and handed, unchanged, to the region's change handler on the next frame.
#[derive(Clone, Debug, PartialEq)]
pub struct VisibilityEvent {
    /// Region this event is about
    pub region: RegionId,
    /// True when the region now intersects the (margin adjusted) viewport
    pub is_visible: bool,
    /// Visible fraction of the region, `0.0..=1.0`
    pub intersection_ratio: f32,
    /// Bounding box of the region at the time of the change, if known
    pub bounds: Option<Rect>,
}

impl VisibilityEvent {
    /// Event for a region that became visible.
    pub fn visible(region: RegionId) -> Self {
        Self {
            region,
            is_visible: true,
            intersection_ratio: 1.0,
            bounds: None,
        }
    }

    /// Event for a region that left the viewport.
    pub fn hidden(region: RegionId) -> Self {
        Self {
            region,
            is_visible: false,
            intersection_ratio: 0.0,
            bounds: None,
        }
    }

    pub fn with_ratio(mut self, ratio: f32) -> Self {
        self.intersection_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }
}
