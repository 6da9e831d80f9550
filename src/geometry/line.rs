//! Slope/intercept line representation
//!
//! Used to intersect perpendicular bisectors when a Corner's circumcenter has
//! to be recomputed after an edge flip.

use super::{Vector2, EPSILON};

/// A line in slope/intercept form `y = m·x + b`
///
/// Vertical lines cannot be written that way; for them `vertical` is set and
/// `b` holds the x coordinate of the line instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineEquation {
    /// Slope (0 for vertical lines)
    pub m: f64,
    /// Y intercept, or the x coordinate when `vertical`
    pub b: f64,
    /// True if the line is parallel to the y axis
    pub vertical: bool,
}

impl LineEquation {
    /// Line through two points
    pub fn through(p1: Vector2, p2: Vector2) -> Self {
        let dx = p2.x - p1.x;
        if dx.abs() < EPSILON {
            Self::vertical(p1.x)
        } else {
            Self::with_slope(p1, (p2.y - p1.y) / dx)
        }
    }

    /// Non-vertical line through `p` with slope `m`
    pub fn with_slope(p: Vector2, m: f64) -> Self {
        Self {
            m,
            b: p.y - p.x * m,
            vertical: false,
        }
    }

    /// Vertical line `x = x`
    pub fn vertical(x: f64) -> Self {
        Self {
            m: 0.0,
            b: x,
            vertical: true,
        }
    }

    /// Perpendicular bisector of the segment `p1 p2`
    pub fn perpendicular_bisector(p1: Vector2, p2: Vector2) -> Self {
        let mid = (p1 + p2) * 0.5;
        let d = p2 - p1;
        if d.y.abs() < EPSILON {
            Self::vertical(mid.x)
        } else {
            Self::with_slope(mid, -d.x / d.y)
        }
    }

    /// Evaluate `y` at `x`; `None` for vertical lines
    pub fn value_at(&self, x: f64) -> Option<f64> {
        if self.vertical {
            None
        } else {
            Some(self.m * x + self.b)
        }
    }

    /// Shift the line by `offset`
    pub fn translate(&mut self, offset: Vector2) {
        if self.vertical {
            self.b += offset.x;
        } else {
            self.b += offset.y - self.m * offset.x;
        }
    }

    /// Intersection point with another line, `None` if the lines are parallel
    pub fn intersection(&self, other: &LineEquation) -> Option<Vector2> {
        match (self.vertical, other.vertical) {
            (true, true) => None,
            (true, false) => Some(Vector2::new(self.b, other.m * self.b + other.b)),
            (false, true) => Some(Vector2::new(other.b, self.m * other.b + self.b)),
            (false, false) => {
                let dm = self.m - other.m;
                if dm.abs() < EPSILON {
                    return None;
                }
                let x = (other.b - self.b) / dm;
                Some(Vector2::new(x, self.m * x + self.b))
            }
        }
    }

    #[inline]
    pub fn is_horizontal(&self) -> bool {
        !self.vertical && self.m.abs() < EPSILON
    }

    #[inline]
    pub fn is_vertical(&self) -> bool {
        self.vertical
    }
}
