//! Region quadtree for point-to-polygon lookups
//!
//! Centers are indexed by the bounding box of their polygon. A box is stored
//! in every leaf it overlaps, so a point query only has to walk one path from
//! the root and filter the leaf's entries by box containment.

use crate::geometry::{Aabb, Vector2};
use crate::graph::CenterId;

#[derive(Debug, Clone)]
struct Node {
    bounds: Aabb,
    depth: usize,
    children: Option<[usize; 4]>,
    items: Vec<(CenterId, Aabb)>,
}

impl Node {
    fn new(bounds: Aabb, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            children: None,
            items: Vec::new(),
        }
    }
}

/// Quadtree of Center bounding boxes
///
/// Nodes live in one arena; a node splits into four quadrants lazily on the
/// first insert that reaches it above `max_depth`, and entries are only ever
/// kept in nodes at `max_depth`.
///
/// # Performance
///
/// - Insert: O(depth + overlapped leaves)
/// - Query: O(depth + leaf size)
///
/// # Example
///
/// ```
/// use poly_map::geometry::{Aabb, Vector2};
/// use poly_map::spatial::RegionIndex;
///
/// let mut index = RegionIndex::new(Aabb::new(Vector2::ZERO, Vector2::new(100.0, 100.0)), 3);
/// index.insert(7, Aabb::new(Vector2::new(10.0, 10.0), Vector2::new(20.0, 20.0)));
///
/// assert_eq!(index.query_point(Vector2::new(15.0, 15.0)), vec![7]);
/// assert!(index.query_point(Vector2::new(50.0, 50.0)).is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct RegionIndex {
    nodes: Vec<Node>,
    max_depth: usize,
    len: usize,
}

impl RegionIndex {
    /// Create an empty index over `bounds`
    ///
    /// # Arguments
    ///
    /// * `bounds` - Region covered by the root node
    /// * `max_depth` - Number of subdivisions from the root to the leaves
    pub fn new(bounds: Aabb, max_depth: usize) -> Self {
        Self {
            nodes: vec![Node::new(bounds, 0)],
            max_depth,
            len: 0,
        }
    }

    /// Add a Center with its bounding box
    ///
    /// A box outside the root bounds is ignored.
    pub fn insert(&mut self, center: CenterId, aabb: Aabb) {
        if !self.nodes[0].bounds.intersects(&aabb) {
            return;
        }
        self.len += 1;

        let mut stack = vec![0];
        while let Some(node) = stack.pop() {
            if self.nodes[node].depth >= self.max_depth {
                self.nodes[node].items.push((center, aabb));
                continue;
            }
            let children = self.split(node);
            stack.extend(
                children
                    .into_iter()
                    .filter(|&child| self.nodes[child].bounds.intersects(&aabb)),
            );
        }
    }

    /// Centers whose bounding box contains `p`
    ///
    /// Candidates are only filtered by box, not by polygon; the caller picks
    /// the right one.
    pub fn query_point(&self, p: Vector2) -> Vec<CenterId> {
        let mut node = &self.nodes[0];
        if !node.bounds.contains(p) {
            return Vec::new();
        }

        while let Some(children) = node.children {
            node = &self.nodes[children[node.bounds.quadrant_of(p)]];
        }

        node.items
            .iter()
            .filter(|(_, aabb)| aabb.contains(p))
            .map(|&(center, _)| center)
            .collect()
    }

    /// Number of inserted Centers
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.nodes[0].bounds
    }

    /// Children of `node`, creating them on first use
    fn split(&mut self, node: usize) -> [usize; 4] {
        if let Some(children) = self.nodes[node].children {
            return children;
        }
        let depth = self.nodes[node].depth + 1;
        let base = self.nodes.len();
        for bounds in self.nodes[node].bounds.quadrants() {
            self.nodes.push(Node::new(bounds, depth));
        }
        let children = [base, base + 1, base + 2, base + 3];
        self.nodes[node].children = Some(children);
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Aabb {
        Aabb::new(Vector2::new(x, y), Vector2::new(x + size, y + size))
    }

    #[test]
    fn test_region_index_basic() {
        let mut index = RegionIndex::new(square(0.0, 0.0, 64.0), 3);
        index.insert(0, square(1.0, 1.0, 5.0));
        index.insert(1, square(40.0, 40.0, 5.0));
        index.insert(2, square(50.0, 2.0, 5.0));
        assert_eq!(index.len(), 3);

        assert_eq!(index.query_point(Vector2::new(3.0, 3.0)), vec![0]);
        assert_eq!(index.query_point(Vector2::new(42.0, 44.0)), vec![1]);
        assert_eq!(index.query_point(Vector2::new(52.0, 4.0)), vec![2]);
        assert!(index.query_point(Vector2::new(20.0, 20.0)).is_empty());
    }

    #[test]
    fn test_box_across_quadrant_boundary() {
        let mut index = RegionIndex::new(square(0.0, 0.0, 64.0), 4);
        // straddles the root split lines
        index.insert(9, square(28.0, 28.0, 8.0));

        for p in [
            Vector2::new(29.0, 29.0),
            Vector2::new(35.0, 29.0),
            Vector2::new(29.0, 35.0),
            Vector2::new(35.0, 35.0),
            Vector2::new(32.0, 32.0),
        ] {
            assert_eq!(index.query_point(p), vec![9], "missing at {:?}", p);
        }
    }

    #[test]
    fn test_overlapping_boxes_return_all_candidates() {
        let mut index = RegionIndex::new(square(0.0, 0.0, 16.0), 2);
        index.insert(0, square(2.0, 2.0, 6.0));
        index.insert(1, square(4.0, 4.0, 6.0));

        let mut hits = index.query_point(Vector2::new(5.0, 5.0));
        hits.sort_unstable();
        assert_eq!(hits, vec![0, 1]);
    }

    #[test]
    fn test_outside_root() {
        let mut index = RegionIndex::new(square(0.0, 0.0, 10.0), 2);
        index.insert(0, square(20.0, 20.0, 1.0));
        assert!(index.is_empty());
        assert!(index.query_point(Vector2::new(-1.0, 5.0)).is_empty());
    }

    #[test]
    fn test_zero_depth_is_a_flat_list() {
        let mut index = RegionIndex::new(square(0.0, 0.0, 10.0), 0);
        index.insert(3, square(1.0, 1.0, 2.0));
        index.insert(4, square(6.0, 6.0, 2.0));
        assert_eq!(index.query_point(Vector2::new(7.0, 7.0)), vec![4]);
    }
}
