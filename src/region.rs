//! Watched region handles and geometry.
//!
//! A [`RegionId`] identifies a region of interest (a placeholder box, a list
//! row, an image slot) whose visibility relative to the viewport is tracked.
//! The region itself is owned by the host; this crate only ever stores the id.
//!
//! [`Rect`] is a plain pixel rectangle. It is used for optional bounding
//! geometry on [`VisibilityEvent`](crate::VisibilityEvent)s and for applying a
//! [`RootMargin`](crate::config::RootMargin) to a viewport.

use std::fmt;
use uuid::Uuid;

/// A unique identifier for a watched region.
///
/// Internally a `RegionId` wraps a [`Uuid`]. Treat it as an opaque handle: the
/// host maps its own region (a DOM node, a widget, a scene node) to an id and
/// hands the id to the [`VisibilityDispatcher`](crate::VisibilityDispatcher).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(Uuid);

impl RegionId {
    /// Create a new unique `RegionId` using a random UUID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RegionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RegionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region:{}", self.0)
    }
}

/// Axis-aligned rectangle in pixels.
#[derive(Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl fmt::Debug for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect {{ x: {}, y: {}, width: {}, height: {} }}",
            self.x, self.y, self.width, self.height
        )
    }
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Returns the overlapping part of `self` and `other`, or `None` when they
    /// do not overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= x || bottom <= y {
            return None;
        }

        Some(Rect::new(x, y, right - x, bottom - y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn region_ids_are_unique() {
        let ids: HashSet<RegionId> = (0..64).map(|_| RegionId::new()).collect();
        assert_eq!(ids.len(), 64);
    }

    #[test]
    fn region_id_from_uuid_is_stable() {
        let uuid = Uuid::new_v4();
        assert_eq!(RegionId::from(uuid), RegionId::from(uuid));
        assert!(RegionId::from(uuid).to_string().starts_with("region:"));
    }

    #[test]
    fn intersection_of_overlapping_rects() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(50.0, 80.0, 100.0, 100.0);
        assert_eq!(a.intersection(&b), Some(Rect::new(50.0, 80.0, 50.0, 20.0)));
    }

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(0.0, 100.0, 100.0, 100.0);
        assert_eq!(a.intersection(&b), None);
    }
}
