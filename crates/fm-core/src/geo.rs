//! Planar coordinate type used for vertex positions and robot interpolation.
//!
//! Graph definitions are authored in screen-like units (pixels on the
//! a drawing canvas), so plain Euclidean geometry in `f64` is all that is
//! needed.

/// A point on the navigation plane.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Straight-line distance to `other`.
    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Linear interpolation from `self` towards `other`.
    ///
    /// `t` is clamped to `[0, 1]`, so `lerp(_, 1.0)` is exactly `other`.
    #[inline]
    pub fn lerp(self, other: Point, t: f64) -> Point {
        let t = t.clamp(0.0, 1.0);
        Point {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// Independent-axis window check: both `|dx|` and `|dy|` must be within
    /// `tolerance`.  This is the hit-test used for vertices and robots.
    #[inline]
    pub fn within(self, x: f64, y: f64, tolerance: f64) -> bool {
        (self.x - x).abs() <= tolerance && (self.y - y).abs() <= tolerance
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}
