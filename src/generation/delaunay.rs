//! Incremental Delaunay triangulation
//!
//! Bowyer–Watson insertion with a bounding super-triangle and an x-sweep:
//! vertices are inserted in their total order (x, then y), so any triangle
//! whose circumcircle lies entirely left of the current vertex can never be
//! touched again and is moved straight to the output. The fixed insertion
//! order makes the result a pure function of the input point set, which the
//! seeded map pipeline depends on.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::geometry::{Vector2, EPSILON};

/// Index of a vertex inside [`Triangulation::vertices`]
pub type VertexId = usize;

/// Circumradius² inflation that keeps points on a circle from flapping in and out
const RADIUS_INFLATION: f64 = 1.000_001;

/// Bounding box growth before the super-triangle is sized around it
const SUPER_MARGIN: f64 = 0.01;

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Triangulation vertex with a lexicographic total order
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
}

impl Vertex {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn position(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }
}

impl From<Vector2> for Vertex {
    fn from(p: Vector2) -> Self {
        Self::new(p.x, p.y)
    }
}

impl Ord for Vertex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }
}

impl PartialOrd for Vertex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Vertex {}

/// Triangle over three vertex ids with its cached circumcircle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [VertexId; 3],
    pub circumcenter: Vector2,
    /// Exact circumradius
    pub radius: f64,
    /// Inflated circumradius², used for containment tests
    pub radius_squared: f64,
}

impl Triangle {
    /// Build a triangle and compute its circumcircle from `positions`
    pub fn new(vertices: [VertexId; 3], positions: &[Vertex]) -> Self {
        let [a, b, c] = vertices.map(|id| positions[id]);
        let circumcenter = circumcircle_center(a, b, c);
        let r_sq = [a, b, c]
            .iter()
            .map(|v| v.position().distance_squared(circumcenter))
            .fold(0.0, f64::max);

        Self {
            vertices,
            circumcenter,
            radius: r_sq.sqrt(),
            radius_squared: r_sq * RADIUS_INFLATION,
        }
    }

    #[inline]
    pub fn has_vertex(&self, id: VertexId) -> bool {
        self.vertices.contains(&id)
    }

    /// The three edges as vertex id pairs
    #[inline]
    pub fn edges(&self) -> [(VertexId, VertexId); 3] {
        let [a, b, c] = self.vertices;
        [(a, b), (b, c), (c, a)]
    }

    /// True if the whole circumcircle lies left of `v`
    #[inline]
    fn is_left_of(&self, v: &Vertex) -> bool {
        self.circumcenter.x + self.radius < v.x
    }

    /// True if `v` lies inside the (inflated) circumcircle
    #[inline]
    fn encompasses(&self, v: &Vertex) -> bool {
        v.position().distance_squared(self.circumcenter) <= self.radius_squared
    }
}

/// Circumcenter via perpendicular bisector slopes, with the axis-aligned
/// cases handled separately so no slope divides by zero
fn circumcircle_center(v0: Vertex, v1: Vertex, v2: Vertex) -> Vector2 {
    let (x0, y0) = (v0.x, v0.y);
    let (x1, y1) = (v1.x, v1.y);
    let (x2, y2) = (v2.x, v2.y);

    let y10 = y1 - y0;
    let y21 = y2 - y1;
    let y10_zero = y10.abs() < EPSILON;
    let y21_zero = y21.abs() < EPSILON;

    if y10_zero && y21_zero {
        return collinear_center(v0, v1, v2);
    }

    if y10_zero {
        let m1 = -(x2 - x1) / y21;
        let (mx1, my1) = ((x1 + x2) * 0.5, (y1 + y2) * 0.5);
        let cx = (x0 + x1) * 0.5;
        return Vector2::new(cx, m1 * (cx - mx1) + my1);
    }

    if y21_zero {
        let m0 = -(x1 - x0) / y10;
        let (mx0, my0) = ((x0 + x1) * 0.5, (y0 + y1) * 0.5);
        let cx = (x1 + x2) * 0.5;
        return Vector2::new(cx, m0 * (cx - mx0) + my0);
    }

    let m0 = -(x1 - x0) / y10;
    let m1 = -(x2 - x1) / y21;
    if (m0 - m1).abs() < EPSILON {
        return collinear_center(v0, v1, v2);
    }

    let (mx0, my0) = ((x0 + x1) * 0.5, (y0 + y1) * 0.5);
    let (mx1, my1) = ((x1 + x2) * 0.5, (y1 + y2) * 0.5);
    let cx = (m0 * mx0 - m1 * mx1 + my1 - my0) / (m0 - m1);
    Vector2::new(cx, m0 * (cx - mx0) + my0)
}

/// Zero-area triangles get the middle of their extent as a finite stand-in
fn collinear_center(v0: Vertex, v1: Vertex, v2: Vertex) -> Vector2 {
    let min = v0.position().min(v1.position()).min(v2.position());
    let max = v0.position().max(v1.position()).max(v2.position());
    (min + max) * 0.5
}

/// Undirected edge, lesser vertex first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct EdgeKey(VertexId, VertexId);

impl EdgeKey {
    fn new(a: VertexId, b: VertexId, vertices: &[Vertex]) -> Self {
        if vertices[a] < vertices[b] {
            EdgeKey(a, b)
        } else {
            EdgeKey(b, a)
        }
    }
}

/// Adding an edge a second time removes it, so after visiting every triangle
/// of a cavity only its boundary remains
fn toggle_edge(edges: &mut BTreeSet<EdgeKey>, edge: EdgeKey) {
    if !edges.remove(&edge) {
        edges.insert(edge);
    }
}

/// Output of [`triangulate`]
#[derive(Debug, Clone, Default)]
pub struct Triangulation {
    /// Unique input vertices in sorted order
    pub vertices: Vec<Vertex>,
    /// Triangles indexing `vertices`, ordered by circumcenter
    pub triangles: Vec<Triangle>,
}

impl Triangulation {
    /// Assemble a triangulation from explicit vertex triples
    ///
    /// Used for hand-built meshes; no Delaunay property is checked.
    pub fn from_parts(vertices: Vec<Vertex>, triples: &[[VertexId; 3]]) -> Self {
        let triangles = triples
            .iter()
            .map(|&ids| Triangle::new(ids, &vertices))
            .collect();
        Self {
            vertices,
            triangles,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

/// Triangulate a point set
///
/// Points are de-duplicated and sorted first. Fewer than three unique points
/// produce an empty triangle list. Collinear or near-duplicate input may yield
/// zero-area triangles; they are kept, with a finite circumcenter.
///
/// # Example
///
/// ```
/// use poly_map::generation::triangulate;
/// use poly_map::geometry::Vector2;
///
/// let points = [
///     Vector2::new(0.0, 0.0),
///     Vector2::new(10.0, 0.0),
///     Vector2::new(0.0, 10.0),
///     Vector2::new(10.0, 10.0),
///     Vector2::new(5.0, 5.0),
/// ];
/// let triangulation = triangulate(&points);
/// assert_eq!(triangulation.triangle_count(), 4);
/// ```
pub fn triangulate(points: &[Vector2]) -> Triangulation {
    let unique: BTreeSet<Vertex> = points
        .iter()
        .filter(|p| p.is_finite())
        .map(|&p| Vertex::from(p))
        .collect();
    let mut vertices: Vec<Vertex> = unique.into_iter().collect();
    let n = vertices.len();

    if n < 3 {
        return Triangulation {
            vertices,
            triangles: Vec::new(),
        };
    }

    vertices.extend(super_triangle(&vertices));
    let touches_super = |t: &Triangle| t.vertices.iter().any(|&id| id >= n);

    let mut workset = vec![Triangle::new([n, n + 1, n + 2], &vertices)];
    let mut output: Vec<Triangle> = Vec::new();
    let mut cavity: BTreeSet<EdgeKey> = BTreeSet::new();

    for id in 0..n {
        let vertex = vertices[id];

        workset.retain(|t| {
            if t.is_left_of(&vertex) {
                if !touches_super(t) {
                    output.push(*t);
                }
                false
            } else {
                true
            }
        });

        cavity.clear();
        workset.retain(|t| {
            if t.encompasses(&vertex) {
                for (a, b) in t.edges() {
                    toggle_edge(&mut cavity, EdgeKey::new(a, b, &vertices));
                }
                false
            } else {
                true
            }
        });

        for edge in &cavity {
            workset.push(Triangle::new([edge.0, edge.1, id], &vertices));
        }
    }

    output.extend(workset.into_iter().filter(|t| !touches_super(t)));
    output.sort_by(|a, b| {
        a.circumcenter
            .x
            .total_cmp(&b.circumcenter.x)
            .then_with(|| a.circumcenter.y.total_cmp(&b.circumcenter.y))
            .then_with(|| a.vertices.cmp(&b.vertices))
    });

    vertices.truncate(n);
    Triangulation {
        vertices,
        triangles: output,
    }
}

/// Triangle strictly enclosing every vertex; `vertices` must be sorted by x
fn super_triangle(vertices: &[Vertex]) -> [Vertex; 3] {
    let mut x_min = vertices[0].x;
    let mut x_max = vertices[vertices.len() - 1].x;
    let (mut y_min, mut y_max) = vertices
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v.y), hi.max(v.y))
        });

    let mut dx = x_max - x_min;
    let mut dy = y_max - y_min;
    let ddx = (dx * SUPER_MARGIN).max(EPSILON);
    let ddy = (dy * SUPER_MARGIN).max(EPSILON);

    x_min -= ddx;
    x_max += ddx;
    dx += 2.0 * ddx;
    y_min -= ddy;
    y_max += ddy;
    dy += 2.0 * ddy;

    [
        Vertex::new(x_min - dy * SQRT_3 / 3.0, y_min),
        Vertex::new(x_max + dy * SQRT_3 / 3.0, y_min),
        Vertex::new((x_min + x_max) * 0.5, y_max + dx * SQRT_3 * 0.5),
    ]
}
