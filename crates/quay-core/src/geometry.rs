#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! Pixel coordinates (0-indexed, origin at top-left, y growing downwards).
//! Widths and heights are signed so intermediate arithmetic can go negative;
//! a rectangle with a non-positive extent is considered empty.

use serde::{Deserialize, Serialize};

/// A point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A two-dimensional extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Check if either extent is non-positive.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Check if both extents are zero.
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.width == 0 && self.height == 0
    }

    /// Component-wise maximum with `other`.
    #[inline]
    pub fn expanded_to(self, other: Size) -> Size {
        Size::new(self.width.max(other.width), self.height.max(other.height))
    }

    /// Component-wise minimum with `other`.
    #[inline]
    pub fn bounded_to(self, other: Size) -> Size {
        Size::new(self.width.min(other.width), self.height.min(other.height))
    }
}

impl std::ops::Add for Size {
    type Output = Size;

    #[inline]
    fn add(self, rhs: Size) -> Size {
        Size::new(self.width + rhs.width, self.height + rhs.height)
    }
}

impl std::ops::Sub for Size {
    type Output = Size;

    #[inline]
    fn sub(self, rhs: Size) -> Size {
        Size::new(self.width - rhs.width, self.height - rhs.height)
    }
}

/// A rectangle for layout bounds and hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with the given size.
    #[inline]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Top-left corner.
    #[inline]
    pub const fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Extent of the rectangle.
    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Check if the rectangle has a non-positive extent.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Check if position and extent are all zero.
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.x == 0 && self.y == 0 && self.width == 0 && self.height == 0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub const fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Check if `other` lies fully inside the rectangle.
    #[inline]
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Return the rectangle moved so its top-left corner is `p`.
    #[inline]
    pub const fn moved_to(&self, p: Point) -> Rect {
        Rect::new(p.x, p.y, self.width, self.height)
    }

    /// Return the rectangle translated by `delta`.
    #[inline]
    pub const fn translated(&self, delta: Point) -> Rect {
        Rect::new(self.x + delta.x, self.y + delta.y, self.width, self.height)
    }

    /// Return the rectangle with a new size, keeping the top-left corner.
    #[inline]
    pub const fn with_size(&self, size: Size) -> Rect {
        Rect::new(self.x, self.y, size.width, size.height)
    }
}

#[cfg(test)]
mod tests {
    use super::{Point, Rect, Size};

    // --- Size ---

    #[test]
    fn size_empty_and_null() {
        assert!(Size::new(0, 0).is_null());
        assert!(Size::new(0, 0).is_empty());
        assert!(Size::new(0, 10).is_empty());
        assert!(!Size::new(0, 10).is_null());
        assert!(!Size::new(1, 1).is_empty());
    }

    #[test]
    fn size_expanded_and_bounded() {
        let a = Size::new(80, 90);
        let b = Size::new(100, 50);
        assert_eq!(a.expanded_to(b), Size::new(100, 90));
        assert_eq!(a.bounded_to(b), Size::new(80, 50));
    }

    #[test]
    fn size_arithmetic() {
        assert_eq!(Size::new(3, 4) + Size::new(1, 2), Size::new(4, 6));
        assert_eq!(Size::new(3, 4) - Size::new(1, 2), Size::new(2, 2));
    }

    // --- Point ---

    #[test]
    fn point_arithmetic() {
        assert_eq!(Point::new(3, 4) + Point::new(1, 2), Point::new(4, 6));
        assert_eq!(Point::new(3, 4) - Point::new(1, 2), Point::new(2, 2));
    }

    // --- Rect ---

    #[test]
    fn rect_edges_exclusive() {
        let r = Rect::new(10, 20, 30, 40);
        assert_eq!(r.right(), 40);
        assert_eq!(r.bottom(), 60);
        assert_eq!(r.top_left(), Point::new(10, 20));
        assert_eq!(r.size(), Size::new(30, 40));
    }

    #[test]
    fn rect_contains_boundary() {
        let r = Rect::new(0, 0, 5, 5);
        assert!(r.contains(Point::new(0, 0)));
        assert!(r.contains(Point::new(4, 4)));
        assert!(!r.contains(Point::new(5, 0)));
        assert!(!r.contains(Point::new(0, 5)));
    }

    #[test]
    fn rect_contains_rect() {
        let outer = Rect::new(0, 0, 10, 10);
        assert!(outer.contains_rect(&Rect::new(2, 2, 3, 3)));
        assert!(outer.contains_rect(&outer));
        assert!(!outer.contains_rect(&Rect::new(8, 8, 3, 3)));
    }

    #[test]
    fn rect_moves_keep_size() {
        let r = Rect::new(1, 2, 3, 4);
        assert_eq!(r.moved_to(Point::new(9, 9)), Rect::new(9, 9, 3, 4));
        assert_eq!(r.translated(Point::new(1, -1)), Rect::new(2, 1, 3, 4));
        assert_eq!(r.with_size(Size::new(7, 8)), Rect::new(1, 2, 7, 8));
    }

    #[test]
    fn rect_null_and_empty() {
        assert!(Rect::default().is_null());
        assert!(Rect::new(5, 5, 0, 0).is_empty());
        assert!(!Rect::new(5, 5, 0, 0).is_null());
        assert!(!Rect::new(0, 0, 1, 1).is_empty());
    }

    #[test]
    fn rect_serializes_as_flat_map() {
        let r = Rect::new(1, 2, 3, 4);
        let json = serde_json::to_value(r).expect("rect should serialize");
        assert_eq!(json["x"], 1);
        assert_eq!(json["y"], 2);
        assert_eq!(json["width"], 3);
        assert_eq!(json["height"], 4);
    }
}
