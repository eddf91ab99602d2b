//! Per-node cached geometry and size constraints.

use quay_core::{Point, Rect, Size};

use crate::{HARD_MAX_SIZE, HARD_MIN_SIZE, Orientation, length_along, pos_along};

/// Cached geometry, constraints and layout share of a single node.
///
/// Pure value type. The geometry is expressed in the parent container's
/// coordinates; `percentage_within_parent` is the node's share of the
/// parent's usable length and is recomputed after every layout change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingInfo {
    /// Geometry in parent-local coordinates.
    pub geometry: Rect,
    /// Minimum size. Never below [`HARD_MIN_SIZE`] for guest leaves.
    pub min_size: Size,
    /// Advisory maximum size; stored and serialized, not enforced.
    pub max_size: Size,
    /// Share of the parent's usable length, in `[0, 1]`.
    pub percentage_within_parent: f64,
    /// Set while a compound insertion is sizing this node; suppresses
    /// geometry publication until the insertion settles.
    pub is_being_inserted: bool,
}

impl Default for SizingInfo {
    fn default() -> Self {
        Self {
            geometry: Rect::default(),
            min_size: HARD_MIN_SIZE,
            max_size: HARD_MAX_SIZE,
            percentage_within_parent: 0.0,
            is_being_inserted: false,
        }
    }
}

impl SizingInfo {
    /// Current extent.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.geometry.size()
    }

    /// Replace the extent, keeping the position.
    #[inline]
    pub const fn set_size(&mut self, sz: Size) {
        self.geometry.width = sz.width;
        self.geometry.height = sz.height;
    }

    /// Length along `o`.
    #[inline]
    #[must_use]
    pub const fn length(&self, o: Orientation) -> i32 {
        length_along(self.size(), o)
    }

    /// Minimum length along `o`.
    #[inline]
    #[must_use]
    pub const fn min_length(&self, o: Orientation) -> i32 {
        length_along(self.min_size, o)
    }

    /// Length this node can still give up along `o` before hitting its
    /// minimum.
    #[inline]
    #[must_use]
    pub fn available_length(&self, o: Orientation) -> i32 {
        (self.length(o) - self.min_length(o)).max(0)
    }

    /// Length this node still needs along `o` to reach its minimum.
    #[inline]
    #[must_use]
    pub fn missing_length(&self, o: Orientation) -> i32 {
        (self.min_length(o) - self.length(o)).max(0)
    }

    /// Top-left corner in parent coordinates.
    #[inline]
    #[must_use]
    pub const fn pos(&self) -> Point {
        self.geometry.top_left()
    }

    /// Position along `o`.
    #[inline]
    #[must_use]
    pub const fn position(&self, o: Orientation) -> i32 {
        pos_along(self.pos(), o)
    }

    /// Inclusive far edge along `o`.
    #[inline]
    #[must_use]
    pub const fn edge(&self, o: Orientation) -> i32 {
        match o {
            Orientation::Horizontal => self.geometry.right() - 1,
            Orientation::Vertical => self.geometry.bottom() - 1,
        }
    }

    /// Set the length along `o`, keeping the position.
    #[inline]
    pub const fn set_length(&mut self, l: i32, o: Orientation) {
        match o {
            Orientation::Horizontal => self.geometry.width = l,
            Orientation::Vertical => self.geometry.height = l,
        }
    }

    /// Grow (or shrink, if negative) the length along `o` by `by_amount`.
    #[inline]
    pub const fn increment_length(&mut self, by_amount: i32, o: Orientation) {
        self.set_length(self.length(o) + by_amount, o);
    }

    /// Set the length along the axis perpendicular to `o`.
    #[inline]
    pub const fn set_opposite_length(&mut self, l: i32, o: Orientation) {
        self.set_length(l, o.opposite());
    }

    /// Set the position along `o`, keeping the extent.
    #[inline]
    pub const fn set_pos(&mut self, p: i32, o: Orientation) {
        match o {
            Orientation::Horizontal => self.geometry.x = p,
            Orientation::Vertical => self.geometry.y = p,
        }
    }

    /// True when the geometry is all zeroes.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.geometry.is_null()
    }

    /// Size still missing to satisfy `min_size`, clamped to zero.
    #[must_use]
    pub fn missing_size(&self) -> Size {
        let missing = self.min_size - self.size();
        Size::new(missing.width.max(0), missing.height.max(0))
    }
}

/// Accumulated length and minimum length over a run of siblings on one side
/// of an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LengthOnSide {
    pub length: i32,
    pub min_length: i32,
}

impl LengthOnSide {
    /// Length the run can still donate.
    #[inline]
    #[must_use]
    pub fn available(&self) -> i32 {
        (self.length - self.min_length).max(0)
    }

    /// Length the run is short of its minimum.
    #[inline]
    #[must_use]
    pub fn missing(&self) -> i32 {
        (self.min_length - self.length).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(rect: Rect, min: Size) -> SizingInfo {
        SizingInfo {
            geometry: rect,
            min_size: min,
            ..SizingInfo::default()
        }
    }

    #[test]
    fn lengths_project_by_orientation() {
        let s = info(Rect::new(10, 20, 300, 400), Size::new(80, 90));
        assert_eq!(s.length(Orientation::Horizontal), 300);
        assert_eq!(s.length(Orientation::Vertical), 400);
        assert_eq!(s.min_length(Orientation::Horizontal), 80);
        assert_eq!(s.min_length(Orientation::Vertical), 90);
        assert_eq!(s.position(Orientation::Horizontal), 10);
        assert_eq!(s.position(Orientation::Vertical), 20);
    }

    #[test]
    fn available_and_missing_clamp_at_zero() {
        let s = info(Rect::new(0, 0, 100, 50), Size::new(80, 90));
        assert_eq!(s.available_length(Orientation::Horizontal), 20);
        assert_eq!(s.missing_length(Orientation::Horizontal), 0);
        assert_eq!(s.available_length(Orientation::Vertical), 0);
        assert_eq!(s.missing_length(Orientation::Vertical), 40);
        assert_eq!(s.missing_size(), Size::new(0, 40));
    }

    #[test]
    fn edge_is_inclusive() {
        let s = info(Rect::new(0, 0, 497, 600), Size::new(80, 90));
        assert_eq!(s.edge(Orientation::Horizontal), 496);
        assert_eq!(s.edge(Orientation::Vertical), 599);
    }

    #[test]
    fn mutators_touch_one_axis() {
        let mut s = info(Rect::new(5, 6, 100, 200), Size::new(80, 90));
        s.set_length(150, Orientation::Horizontal);
        assert_eq!(s.geometry, Rect::new(5, 6, 150, 200));
        s.increment_length(-50, Orientation::Horizontal);
        assert_eq!(s.geometry, Rect::new(5, 6, 100, 200));
        s.set_opposite_length(300, Orientation::Horizontal);
        assert_eq!(s.geometry, Rect::new(5, 6, 100, 300));
        s.set_pos(9, Orientation::Vertical);
        assert_eq!(s.geometry, Rect::new(5, 9, 100, 300));
    }

    #[test]
    fn length_on_side_accumulator() {
        let run = LengthOnSide {
            length: 100,
            min_length: 80,
        };
        assert_eq!(run.available(), 20);
        assert_eq!(run.missing(), 0);

        let starved = LengthOnSide {
            length: 60,
            min_length: 80,
        };
        assert_eq!(starved.available(), 0);
        assert_eq!(starved.missing(), 20);
    }
}
