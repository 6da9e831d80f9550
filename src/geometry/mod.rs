//! 2D geometry primitives
//!
//! Vector algebra comes from glam's `DVec2`; this module adds the pieces the
//! map generator needs on top of it: bounding boxes, line intersection and
//! circumcenters, and simple polygon predicates.

mod line;

pub use line::LineEquation;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 2D vector / point type used throughout the crate
pub type Vector2 = glam::DVec2;

/// Threshold for "effectively zero" comparisons (single precision machine epsilon)
pub const EPSILON: f64 = 1.192_092_896e-7;

/// Axis-aligned bounding box
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vector2,
    pub max: Vector2,
}

impl Aabb {
    pub fn new(min: Vector2, max: Vector2) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, `None` for an empty iterator
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vector2>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::new(first, first), |aabb, p| {
            Self::new(aabb.min.min(p), aabb.max.max(p))
        }))
    }

    #[inline]
    pub fn center(&self) -> Vector2 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn size(&self) -> Vector2 {
        self.max - self.min
    }

    /// Inclusive point containment
    #[inline]
    pub fn contains(&self, p: Vector2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Inclusive overlap test
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// The four quadrants, indexed so that `quadrants()[self.quadrant_of(p)]`
    /// is the quadrant holding `p`
    pub fn quadrants(&self) -> [Aabb; 4] {
        let c = self.center();
        [
            Aabb::new(self.min, c),
            Aabb::new(Vector2::new(c.x, self.min.y), Vector2::new(self.max.x, c.y)),
            Aabb::new(Vector2::new(self.min.x, c.y), Vector2::new(c.x, self.max.y)),
            Aabb::new(c, self.max),
        ]
    }

    /// Index of the quadrant containing `p`; points on the split lines belong
    /// to the higher quadrant so every point has exactly one
    #[inline]
    pub fn quadrant_of(&self, p: Vector2) -> usize {
        let c = self.center();
        let east = usize::from(p.x >= c.x);
        let south = usize::from(p.y >= c.y);
        south * 2 + east
    }
}

/// Circumcenter of the triangle `a b c`, `None` when the points are collinear
pub fn circumcenter(a: Vector2, b: Vector2, c: Vector2) -> Option<Vector2> {
    let cross = (b - a).perp_dot(c - a);
    if cross.abs() < EPSILON {
        return None;
    }
    let ab = LineEquation::perpendicular_bisector(a, b);
    let bc = LineEquation::perpendicular_bisector(b, c);
    ab.intersection(&bc)
}

/// Even-odd point in polygon test
pub fn polygon_contains(polygon: &[Vector2], p: Vector2) -> bool {
    let mut inside = false;
    let n = polygon.len();
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Signed shoelace area, positive for counter-clockwise winding (y up)
pub fn polygon_signed_area(polygon: &[Vector2]) -> f64 {
    let n = polygon.len();
    (0..n)
        .map(|i| polygon[i].perp_dot(polygon[(i + 1) % n]))
        .sum::<f64>()
        * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_from_points() {
        let aabb = Aabb::from_points([
            Vector2::new(1.0, 5.0),
            Vector2::new(-2.0, 3.0),
            Vector2::new(4.0, -1.0),
        ])
        .unwrap();
        assert_eq!(aabb.min, Vector2::new(-2.0, -1.0));
        assert_eq!(aabb.max, Vector2::new(4.0, 5.0));
        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_aabb_quadrants_partition() {
        let aabb = Aabb::new(Vector2::ZERO, Vector2::new(8.0, 4.0));
        let quads = aabb.quadrants();
        for p in [
            Vector2::new(1.0, 1.0),
            Vector2::new(7.0, 1.0),
            Vector2::new(1.0, 3.0),
            Vector2::new(7.0, 3.0),
            Vector2::new(4.0, 2.0),
        ] {
            let q = aabb.quadrant_of(p);
            assert!(quads[q].contains(p), "{:?} not in quadrant {}", p, q);
        }
        assert_eq!(aabb.quadrant_of(Vector2::new(4.0, 2.0)), 3);
    }

    #[test]
    fn test_aabb_intersects() {
        let a = Aabb::new(Vector2::ZERO, Vector2::new(2.0, 2.0));
        let b = Aabb::new(Vector2::new(2.0, 1.0), Vector2::new(3.0, 3.0));
        let c = Aabb::new(Vector2::new(2.5, 0.0), Vector2::new(3.0, 3.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_circumcenter() {
        let c = circumcenter(
            Vector2::new(0.0, 0.0),
            Vector2::new(4.0, 0.0),
            Vector2::new(0.0, 4.0),
        )
        .unwrap();
        assert!(c.distance(Vector2::new(2.0, 2.0)) < 1e-9);

        assert!(circumcenter(
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(2.0, 2.0)
        )
        .is_none());
    }

    #[test]
    fn test_polygon_contains() {
        let square = [
            Vector2::new(0.0, 0.0),
            Vector2::new(2.0, 0.0),
            Vector2::new(2.0, 2.0),
            Vector2::new(0.0, 2.0),
        ];
        assert!(polygon_contains(&square, Vector2::new(1.0, 1.0)));
        assert!(!polygon_contains(&square, Vector2::new(3.0, 1.0)));
        assert!((polygon_signed_area(&square) - 4.0).abs() < 1e-12);
    }
}
