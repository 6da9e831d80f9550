//! Edge flip legalization
//!
//! An edge `d0 d1` with Corners `v0 = (d0, d1, a)` and `v1 = (d0, d1, b)` is
//! illegal when `b` lies strictly inside the circumcircle of `d0 d1 a`.
//! Flipping it turns the edge into `a b`; `v0` becomes `(d0, a, b)` and `v1`
//! becomes `(d1, a, b)`. The four outer edges of the quad are then checked
//! again.

use tracing::{debug, warn};

use super::{CenterId, CornerId, Edge, EdgeId, MapGraph};
use crate::geometry::{circumcenter, Vector2, EPSILON};

impl MapGraph {
    /// True if the edge satisfies the empty-circumcircle property (open edges always do)
    pub fn is_locally_delaunay(&self, edge: EdgeId) -> bool {
        self.flip_candidate(edge).is_none()
    }

    /// Legalize one edge, recursing into the edges around every flip
    ///
    /// # Returns
    ///
    /// The number of flips performed
    pub fn legalize_edge(&mut self, edge: EdgeId) -> usize {
        let budget = 4 * self.edges.len() + 16;
        let mut worklist = vec![edge];
        let mut flips = 0;
        let mut steps = 0;

        while let Some(e) = worklist.pop() {
            steps += 1;
            if steps > budget {
                warn!(target: "poly_map::graph", edge, flips, "legalization budget exhausted");
                break;
            }
            if let Some(quad) = self.flip_candidate(e) {
                if self.flip(e, &quad) {
                    flips += 1;
                    worklist.extend(quad.outer);
                }
            }
        }

        flips
    }

    /// Legalize every edge of the graph
    pub fn legalize_all(&mut self) -> usize {
        let flips: usize = (0..self.edges.len()).map(|e| self.legalize_edge(e)).sum();
        debug!(target: "poly_map::graph", flips, "legalized edges");
        flips
    }

    /// The quad around an illegal edge that can be flipped
    fn flip_candidate(&self, e: EdgeId) -> Option<Quad> {
        let edge = &self.edges[e];
        let (v0, v1) = edge.corners()?;
        let (d0, d1) = (edge.d0, edge.d1);
        let a = self.third_center(v0, d0, d1)?;
        let b = self.third_center(v1, d0, d1)?;
        if a == b || self.find_edge(a, b).is_some() {
            return None;
        }

        let [pd0, pd1, pa, pb] = [d0, d1, a, b].map(|c| self.centers[c].position);
        let center = circumcenter(pd0, pd1, pa)?;
        let r_sq = center.distance_squared(pd0);
        if pb.distance_squared(center) >= r_sq * (1.0 - EPSILON) {
            return None;
        }
        // a and b on opposite sides of d0 d1, d0 and d1 on opposite sides of a b
        if !separates(pd0, pd1, pa, pb) || !separates(pa, pb, pd0, pd1) {
            return None;
        }

        Some(Quad {
            v0,
            v1,
            d0,
            d1,
            a,
            b,
            outer: [
                self.find_edge(d0, a)?,
                self.find_edge(d1, a)?,
                self.find_edge(d0, b)?,
                self.find_edge(d1, b)?,
            ],
        })
    }

    fn third_center(&self, corner: CornerId, d0: CenterId, d1: CenterId) -> Option<CenterId> {
        self.corners[corner]
            .touches
            .iter()
            .copied()
            .find(|&c| c != d0 && c != d1)
    }

    fn flip(&mut self, e: EdgeId, quad: &Quad) -> bool {
        let Quad { v0, v1, d0, d1, a, b, outer } = *quad;
        let [_, e_d1a, e_d0b, _] = outer;

        let Some(p0) = self.triangle_center(d0, a, b) else {
            return false;
        };
        let Some(p1) = self.triangle_center(d1, a, b) else {
            return false;
        };

        // the flipped edge now joins a and b
        let edge = &mut self.edges[e];
        edge.d0 = a;
        edge.d1 = b;
        remove(&mut self.centers[d0].edges, e);
        remove(&mut self.centers[d1].edges, e);
        self.centers[a].edges.push(e);
        self.centers[b].edges.push(e);

        remove(&mut self.centers[d0].neighbors, d1);
        remove(&mut self.centers[d1].neighbors, d0);
        self.centers[a].neighbors.push(b);
        self.centers[b].neighbors.push(a);

        // v0 = (d0, a, b), v1 = (d1, a, b)
        replace(&mut self.corners[v0].touches, d1, b);
        replace(&mut self.corners[v1].touches, d0, a);
        remove(&mut self.centers[d1].corners, v0);
        self.centers[b].corners.push(v0);
        remove(&mut self.centers[d0].corners, v1);
        self.centers[a].corners.push(v1);

        replace(&mut self.corners[v0].edges, e_d1a, e_d0b);
        replace(&mut self.corners[v1].edges, e_d0b, e_d1a);
        swap_corner(&mut self.edges[e_d1a], v0, v1);
        swap_corner(&mut self.edges[e_d0b], v1, v0);

        self.corners[v0].position = p0;
        self.corners[v1].position = p1;

        for c in [d0, d1, a, b] {
            self.sort_corners(c);
        }
        let mut touched: Vec<CornerId> = vec![v0, v1];
        for oe in outer {
            touched.extend([self.edges[oe].v0, self.edges[oe].v1].into_iter().flatten());
        }
        touched.sort_unstable();
        touched.dedup();
        for q in touched {
            self.refresh_adjacent(q);
        }

        true
    }

    fn triangle_center(&self, a: CenterId, b: CenterId, c: CenterId) -> Option<Vector2> {
        let [pa, pb, pc] = [a, b, c].map(|id| self.centers[id].position);
        circumcenter(pa, pb, pc)
    }
}

/// Quad around an edge about to be flipped
#[derive(Debug, Clone, Copy)]
struct Quad {
    v0: CornerId,
    v1: CornerId,
    d0: CenterId,
    d1: CenterId,
    a: CenterId,
    b: CenterId,
    /// Edges d0-a, d1-a, d0-b, d1-b
    outer: [EdgeId; 4],
}

/// True if `p` and `q` lie strictly on opposite sides of the line `s t`
fn separates(s: Vector2, t: Vector2, p: Vector2, q: Vector2) -> bool {
    let dir = t - s;
    let side_p = dir.perp_dot(p - s);
    let side_q = dir.perp_dot(q - s);
    side_p * side_q < 0.0
}

fn remove<T: PartialEq + std::fmt::Debug>(list: &mut Vec<T>, value: T) {
    let found = list.iter().position(|x| *x == value);
    debug_assert!(found.is_some(), "{:?} missing from {:?}", value, list);
    if let Some(i) = found {
        list.remove(i);
    }
}

fn replace<T: PartialEq + std::fmt::Debug>(list: &mut [T], old: T, new: T) {
    let slot = list.iter_mut().find(|x| **x == old);
    debug_assert!(slot.is_some(), "{:?} missing, cannot replace with {:?}", old, new);
    if let Some(slot) = slot {
        *slot = new;
    }
}

fn swap_corner(edge: &mut Edge, old: CornerId, new: CornerId) {
    if edge.v0 == Some(old) {
        edge.v0 = Some(new);
    } else if edge.v1 == Some(old) {
        edge.v1 = Some(new);
    } else {
        debug_assert!(false, "edge {} does not end at corner {}", edge.id, old);
    }
}

#[cfg(test)]
mod tests {
    use crate::generation::delaunay::{Triangulation, Vertex};
    use crate::generation::GraphBuilder;
    use crate::geometry::Vector2;

    /// Kite split along its long diagonal
    fn bad_kite() -> crate::graph::MapGraph {
        let vertices = vec![
            Vertex::new(0.0, 0.0),
            Vertex::new(10.0, 0.0),
            Vertex::new(5.0, 1.0),
            Vertex::new(5.0, -1.0),
        ];
        let triangulation = Triangulation::from_parts(vertices, &[[0, 1, 2], [0, 1, 3]]);
        GraphBuilder::build(&triangulation).unwrap()
    }

    fn center_at(g: &crate::graph::MapGraph, x: f64, y: f64) -> usize {
        g.centers
            .iter()
            .position(|c| c.position == Vector2::new(x, y))
            .unwrap()
    }

    #[test]
    fn test_flip_bad_diagonal() {
        let mut g = bad_kite();
        let (d0, d1) = (center_at(&g, 0.0, 0.0), center_at(&g, 10.0, 0.0));
        let (a, b) = (center_at(&g, 5.0, 1.0), center_at(&g, 5.0, -1.0));
        let diagonal = g.find_edge(d0, d1).unwrap();
        assert!(!g.is_locally_delaunay(diagonal));

        assert_eq!(g.legalize_all(), 1);
        g.validate().unwrap();

        assert!(g.find_edge(d0, d1).is_none());
        assert_eq!(g.find_edge(a, b), Some(diagonal));
        assert!(g.centers[a].is_neighbor_of(b));
        assert!(!g.centers[d0].is_neighbor_of(d1));

        let mut positions: Vec<Vector2> = g.corners.iter().map(|q| q.position).collect();
        positions.sort_by(|p, q| p.x.total_cmp(&q.x));
        assert!(positions[0].distance(Vector2::new(2.6, 0.0)) < 1e-9);
        assert!(positions[1].distance(Vector2::new(7.4, 0.0)) < 1e-9);

        for q in &g.corners {
            assert_eq!(q.adjacent.len(), 1);
        }
        assert_eq!(g.legalize_all(), 0);
    }

    #[test]
    fn test_flip_never_duplicates_an_edge() {
        // the bad kite plus a far triangle that already joins its two tips
        let vertices = vec![
            Vertex::new(0.0, 0.0),
            Vertex::new(10.0, 0.0),
            Vertex::new(5.0, 1.0),
            Vertex::new(5.0, -1.0),
            Vertex::new(30.0, 0.0),
        ];
        let triangulation = Triangulation::from_parts(vertices, &[[0, 1, 2], [0, 1, 3], [2, 3, 4]]);
        let mut g = GraphBuilder::build(&triangulation).unwrap();
        let (d0, d1) = (center_at(&g, 0.0, 0.0), center_at(&g, 10.0, 0.0));
        let (a, b) = (center_at(&g, 5.0, 1.0), center_at(&g, 5.0, -1.0));
        let diagonal = g.find_edge(d0, d1).unwrap();
        let tips = g.find_edge(a, b).unwrap();

        assert!(g.is_locally_delaunay(diagonal));
        let before = g.clone();
        assert_eq!(g.legalize_edge(diagonal), 0);
        assert_eq!(g, before);
        assert_eq!(g.find_edge(a, b), Some(tips));
    }

    #[test]
    fn test_open_edges_are_never_flipped() {
        let mut g = bad_kite();
        let hull = (0..g.edges.len()).filter(|&e| g.edges[e].is_open()).collect::<Vec<_>>();
        assert_eq!(hull.len(), 4);
        for e in hull {
            assert!(g.is_locally_delaunay(e));
            assert_eq!(g.legalize_edge(e), 0);
        }
        let diagonal = g.find_edge(center_at(&g, 0.0, 0.0), center_at(&g, 10.0, 0.0)).unwrap();
        assert!(!g.edges[diagonal].is_open());
    }

    #[test]
    fn test_good_diagonal_is_kept() {
        let vertices = vec![
            Vertex::new(0.0, 0.0),
            Vertex::new(10.0, 0.0),
            Vertex::new(5.0, 1.0),
            Vertex::new(5.0, -1.0),
        ];
        let triangulation = Triangulation::from_parts(vertices, &[[2, 3, 0], [2, 3, 1]]);
        let mut g = GraphBuilder::build(&triangulation).unwrap();
        let before = g.clone();
        assert_eq!(g.legalize_all(), 0);
        assert_eq!(g, before);
    }

    #[test]
    fn test_delaunay_output_needs_no_flips() {
        let points: Vec<Vector2> = (0..6)
            .flat_map(|i| {
                (0..6).map(move |j| {
                    Vector2::new(i as f64 * 7.0 + (j % 2) as f64 * 3.0, j as f64 * 6.0)
                })
            })
            .collect();
        let triangulation = crate::generation::triangulate(&points);
        let mut g = GraphBuilder::build(&triangulation).unwrap();
        assert_eq!(g.legalize_all(), 0);
        g.validate().unwrap();
    }
}
