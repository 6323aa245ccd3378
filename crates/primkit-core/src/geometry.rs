#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! Layout works in device-independent `f64` units. An axis of a [`Size`] used
//! as a measure constraint may be `f64::INFINITY`, meaning "unconstrained".
//! NaN is only ever an explicit "unset" sentinel in configuration values; a
//! stored desired size is always finite and non-negative (see
//! [`Size::sanitized`]).

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Zero size.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Unconstrained on both axes.
    pub const INFINITY: Self = Self::new(f64::INFINITY, f64::INFINITY);

    /// Create a new size.
    #[inline]
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Check if either axis is zero.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Whether this size is usable as a stored desired size.
    #[inline]
    #[must_use]
    pub fn is_valid_desired(&self) -> bool {
        valid_len(self.width) && valid_len(self.height)
    }

    /// Map NaN, negative and infinite components to zero.
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self {
            width: if valid_len(self.width) { self.width } else { 0.0 },
            height: if valid_len(self.height) { self.height } else { 0.0 },
        }
    }

    /// Component-wise minimum.
    #[inline]
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.width.min(other.width), self.height.min(other.height))
    }

    /// Component-wise maximum.
    #[inline]
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.width.max(other.width), self.height.max(other.height))
    }
}

#[inline]
fn valid_len(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

/// A position in some coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// The origin.
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    /// Create a new point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A displacement between two points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    /// No displacement.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Create a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Sub for Point {
    type Output = Vector;

    fn sub(self, rhs: Point) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add<Vector> for Point {
    type Output = Point;

    fn add(self, rhs: Vector) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// An arrangement slot in the parent's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width (never negative).
    pub width: f64,
    /// Height (never negative).
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle. Negative extents are clamped to zero.
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    #[must_use]
    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    /// Create a rectangle at `origin` with given size.
    #[inline]
    #[must_use]
    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Top-left corner.
    #[inline]
    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Extent of the rectangle.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Translate by `offset`.
    #[inline]
    #[must_use]
    pub fn offset(self, offset: Vector) -> Self {
        Self {
            x: self.x + offset.x,
            y: self.y + offset.y,
            ..self
        }
    }
}

/// Stacking direction of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Left to right.
    #[default]
    Horizontal,
    /// Top to bottom.
    Vertical,
}

impl Orientation {
    /// Extent of `size` along this orientation.
    #[inline]
    #[must_use]
    pub const fn extent(self, size: Size) -> f64 {
        match self {
            Self::Horizontal => size.width,
            Self::Vertical => size.height,
        }
    }

    /// Extent of `size` across this orientation.
    #[inline]
    #[must_use]
    pub const fn cross(self, size: Size) -> f64 {
        match self {
            Self::Horizontal => size.height,
            Self::Vertical => size.width,
        }
    }

    /// Build a size from an along-axis and a cross-axis extent.
    #[inline]
    #[must_use]
    pub const fn size(self, extent: f64, cross: f64) -> Size {
        match self {
            Self::Horizontal => Size::new(extent, cross),
            Self::Vertical => Size::new(cross, extent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_drops_invalid_components() {
        assert_eq!(Size::new(f64::NAN, 3.0).sanitized(), Size::new(0.0, 3.0));
        assert_eq!(Size::new(-1.0, f64::INFINITY).sanitized(), Size::ZERO);
        assert!(Size::new(2.0, 0.0).is_valid_desired());
        assert!(!Size::INFINITY.is_valid_desired());
    }

    #[test]
    fn point_arithmetic() {
        let a = Point::new(100.0, 100.0);
        let b = Point::new(130.0, 115.0);
        assert_eq!(b - a, Vector::new(30.0, 15.0));
        assert_eq!(a + (b - a), b);
    }

    #[test]
    fn rect_clamps_negative_extent() {
        let r = Rect::new(1.0, 2.0, -5.0, 4.0);
        assert_eq!(r.width, 0.0);
        assert_eq!(r.bottom(), 6.0);
        assert!(!r.contains(Point::new(1.0, 2.0)));
    }

    #[test]
    fn orientation_axes() {
        let s = Size::new(10.0, 20.0);
        assert_eq!(Orientation::Horizontal.extent(s), 10.0);
        assert_eq!(Orientation::Vertical.extent(s), 20.0);
        assert_eq!(Orientation::Vertical.cross(s), 10.0);
        assert_eq!(Orientation::Vertical.size(20.0, 10.0), s);
    }

    #[test]
    fn geometry_loads_from_json() {
        let size: Size = serde_json::from_str(r#"{"width": 4.0, "height": 2.5}"#).unwrap();
        assert_eq!(size, Size::new(4.0, 2.5));
        let o: Orientation = serde_json::from_str(r#""Vertical""#).unwrap();
        assert_eq!(o, Orientation::Vertical);
    }
}
