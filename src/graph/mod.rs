//! Center / Corner / Edge polygon graph
//!
//! The map is a pair of dual graphs stored in three arenas. Centers are the
//! polygon sites (one per triangulation vertex), Corners are polygon vertices
//! (one per triangle circumcenter) and Edges join two Centers across the
//! Delaunay edge they share while recording the one or two Corners that
//! bound the matching polygon side.
//!
//! All cross-references are arena ids. Nothing in the graph owns anything
//! else, so passes can rewrite adjacency with plain index writes.

mod legalize;

use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};
use crate::geometry::{polygon_contains, Aabb, Vector2};
use crate::terrain::Biome;

/// Index into [`MapGraph::centers`]
pub type CenterId = usize;
/// Index into [`MapGraph::corners`]
pub type CornerId = usize;
/// Index into [`MapGraph::edges`]
pub type EdgeId = usize;

/// One map polygon
///
/// Terrain attributes start out at their neutral values and are filled in by
/// the terrain pipeline.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Center {
    /// Arena index, equal to insertion order
    pub id: CenterId,
    /// Polygon site
    pub position: Vector2,

    pub water: bool,
    pub ocean: bool,
    pub coast: bool,
    /// Touches a border Corner
    pub border: bool,
    /// Assigned by the last pipeline pass
    pub biome: Option<Biome>,
    /// Mean of the Corner elevations, in [0, 1]
    pub elevation: f64,
    /// Mean of the Corner moistures, in [0, 1]
    pub moisture: f64,

    /// Polygon vertices in angular order around `position`
    pub corners: Vec<CornerId>,
    /// Edges to neighbouring Centers
    pub edges: Vec<EdgeId>,
    /// Neighbouring Centers, one per edge
    pub neighbors: Vec<CenterId>,
}

impl Center {
    pub fn new(id: CenterId, position: Vector2) -> Self {
        Self {
            id,
            position,
            water: false,
            ocean: false,
            coast: false,
            border: false,
            biome: None,
            elevation: 0.0,
            moisture: 0.0,
            corners: Vec::new(),
            edges: Vec::new(),
            neighbors: Vec::new(),
        }
    }

    #[inline]
    pub fn is_land(&self) -> bool {
        !self.water
    }

    #[inline]
    pub fn neighbor_count(&self) -> usize {
        self.neighbors.len()
    }

    #[inline]
    pub fn is_neighbor_of(&self, other: CenterId) -> bool {
        self.neighbors.contains(&other)
    }
}

/// One polygon vertex, shared by the three Centers of its triangle
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Corner {
    pub id: CornerId,
    /// Circumcenter of the defining triangle
    pub position: Vector2,

    pub water: bool,
    pub ocean: bool,
    pub coast: bool,
    /// Outside the map rectangle or on the triangulation hull
    pub border: bool,
    pub elevation: f64,
    pub moisture: f64,
    /// Accumulated river volume
    pub river: u32,
    /// Lowest adjacent Corner, or this Corner itself at a local minimum
    pub downslope: Option<CornerId>,

    /// Centers of the defining triangle
    pub touches: Vec<CenterId>,
    /// Edges of the defining triangle
    pub edges: Vec<EdgeId>,
    /// Corners across each edge that has two Corners
    pub adjacent: Vec<CornerId>,
}

impl Corner {
    pub fn new(id: CornerId, position: Vector2) -> Self {
        Self {
            id,
            position,
            water: false,
            ocean: false,
            coast: false,
            border: false,
            elevation: 0.0,
            moisture: 0.0,
            river: 0,
            downslope: None,
            touches: Vec::new(),
            edges: Vec::new(),
            adjacent: Vec::new(),
        }
    }

    #[inline]
    pub fn is_land(&self) -> bool {
        !self.water
    }
}

/// Link between two Centers, bounded by up to two Corners
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    /// Delaunay side
    pub d0: CenterId,
    pub d1: CenterId,
    /// Voronoi side; `v1` stays empty on the triangulation hull
    pub v0: Option<CornerId>,
    pub v1: Option<CornerId>,
    /// Accumulated river volume
    pub river: u32,
}

impl Edge {
    pub fn new(id: EdgeId, d0: CenterId, d1: CenterId) -> Self {
        Self {
            id,
            d0,
            d1,
            v0: None,
            v1: None,
            river: 0,
        }
    }

    /// True if the edge is missing a Corner (hull edge)
    #[inline]
    pub fn is_open(&self) -> bool {
        self.v0.is_none() || self.v1.is_none()
    }

    /// Both Corners, when the edge is closed
    #[inline]
    pub fn corners(&self) -> Option<(CornerId, CornerId)> {
        Some((self.v0?, self.v1?))
    }

    #[inline]
    pub fn joins(&self, a: CenterId, b: CenterId) -> bool {
        (self.d0 == a && self.d1 == b) || (self.d0 == b && self.d1 == a)
    }

    /// The Center across the edge from `center`
    #[inline]
    pub fn other_center(&self, center: CenterId) -> Option<CenterId> {
        if self.d0 == center {
            Some(self.d1)
        } else if self.d1 == center {
            Some(self.d0)
        } else {
            None
        }
    }

    /// The Corner across the edge from `corner`
    #[inline]
    pub fn other_corner(&self, corner: CornerId) -> Option<CornerId> {
        match (self.v0, self.v1) {
            (Some(a), Some(b)) if a == corner => Some(b),
            (Some(a), Some(b)) if b == corner => Some(a),
            _ => None,
        }
    }
}

/// Arena storage for the whole polygon graph
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapGraph {
    pub centers: Vec<Center>,
    pub corners: Vec<Corner>,
    pub edges: Vec<Edge>,
}

impl MapGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_center(&mut self, position: Vector2) -> CenterId {
        let id = self.centers.len();
        self.centers.push(Center::new(id, position));
        id
    }

    pub fn add_corner(&mut self, position: Vector2) -> CornerId {
        let id = self.corners.len();
        self.corners.push(Corner::new(id, position));
        id
    }

    /// Create an edge between two Centers and register it on both
    pub fn add_edge(&mut self, d0: CenterId, d1: CenterId) -> EdgeId {
        let id = self.edges.len();
        self.edges.push(Edge::new(id, d0, d1));
        self.centers[d0].edges.push(id);
        self.centers[d1].edges.push(id);
        id
    }

    /// Edge joining two Centers, if they are neighbours
    pub fn find_edge(&self, a: CenterId, b: CenterId) -> Option<EdgeId> {
        self.centers
            .get(a)?
            .edges
            .iter()
            .copied()
            .find(|&e| self.edges[e].joins(a, b))
    }

    /// Edge whose Voronoi side joins two Corners
    pub fn find_corner_edge(&self, a: CornerId, b: CornerId) -> Option<EdgeId> {
        self.corners
            .get(a)?
            .edges
            .iter()
            .copied()
            .find(|&e| self.edges[e].other_corner(a) == Some(b))
    }

    /// Polygon outline of a Center in angular order
    pub fn center_polygon(&self, center: CenterId) -> Vec<Vector2> {
        self.centers[center]
            .corners
            .iter()
            .map(|&q| self.corners[q].position)
            .collect()
    }

    /// Bounding box of the polygon and its site
    pub fn center_bbox(&self, center: CenterId) -> Aabb {
        let site = self.centers[center].position;
        self.center_polygon(center)
            .into_iter()
            .fold(Aabb::new(site, site), |aabb, p| {
                Aabb::new(aabb.min.min(p), aabb.max.max(p))
            })
    }

    /// Point in polygon test against a Center's outline
    pub fn center_contains(&self, center: CenterId, p: Vector2) -> bool {
        let polygon = self.center_polygon(center);
        polygon.len() >= 3 && polygon_contains(&polygon, p)
    }

    /// Midpoint of the Voronoi side of an edge
    pub fn edge_midpoint(&self, edge: EdgeId) -> Option<Vector2> {
        let (a, b) = self.edges[edge].corners()?;
        Some((self.corners[a].position + self.corners[b].position) * 0.5)
    }

    /// Order a Center's corners by angle around its site
    pub(crate) fn sort_corners(&mut self, center: CenterId) {
        let origin = self.centers[center].position;
        let corners = &self.corners;
        let angle = |q: &CornerId| {
            let d = corners[*q].position - origin;
            d.y.atan2(d.x)
        };
        self.centers[center]
            .corners
            .sort_by(|a, b| angle(a).total_cmp(&angle(b)).then_with(|| a.cmp(b)));
    }

    /// Recompute a Corner's neighbours from its edges
    pub(crate) fn refresh_adjacent(&mut self, corner: CornerId) {
        let edges = &self.edges;
        let adjacent = self.corners[corner]
            .edges
            .iter()
            .filter_map(|&e| edges[e].other_corner(corner))
            .collect();
        self.corners[corner].adjacent = adjacent;
    }

    /// Derive neighbour lists and angular corner order from the edges
    pub(crate) fn finish(&mut self) {
        for c in 0..self.centers.len() {
            let edges = &self.edges;
            let neighbors = self.centers[c]
                .edges
                .iter()
                .filter_map(|&e| edges[e].other_center(c))
                .collect();
            self.centers[c].neighbors = neighbors;
            self.sort_corners(c);
            debug_assert!(
                self.centers[c].edges.iter().any(|&e| self.edges[e].is_open())
                    || self.centers[c].corners.len() >= 3,
                "interior center {} has only {} corners",
                c,
                self.centers[c].corners.len()
            );
        }
        for q in 0..self.corners.len() {
            self.refresh_adjacent(q);
        }
    }

    /// Check the structural invariants of the graph
    ///
    /// * every Corner of an edge touches both of the edge's Centers
    /// * every Corner touches exactly three Centers through three edges
    /// * neighbour lists are symmetric
    /// * no two edges join the same pair of Centers
    pub fn validate(&self) -> Result<()> {
        let mut pairs = HashSet::with_capacity(self.edges.len());

        for edge in &self.edges {
            let in_range = edge.d0 < self.centers.len() && edge.d1 < self.centers.len();
            if edge.d0 == edge.d1 || !in_range {
                return Err(MapError::InvariantViolation(format!(
                    "edge {} has invalid centers {} / {}",
                    edge.id, edge.d0, edge.d1
                )));
            }
            if !pairs.insert((edge.d0.min(edge.d1), edge.d0.max(edge.d1))) {
                return Err(MapError::InvariantViolation(format!(
                    "duplicate edge between centers {} and {}",
                    edge.d0, edge.d1
                )));
            }
            for q in [edge.v0, edge.v1].into_iter().flatten() {
                let corner = self.corners.get(q).ok_or_else(|| {
                    MapError::InvariantViolation(format!(
                        "edge {} references missing corner {}",
                        edge.id, q
                    ))
                })?;
                if !corner.touches.contains(&edge.d0) || !corner.touches.contains(&edge.d1) {
                    return Err(MapError::InvariantViolation(format!(
                        "corner {} of edge {} does not touch both of its centers",
                        q, edge.id
                    )));
                }
            }
        }

        for corner in &self.corners {
            if corner.touches.len() != 3 || corner.edges.len() != 3 {
                return Err(MapError::InvariantViolation(format!(
                    "corner {} touches {} centers through {} edges",
                    corner.id,
                    corner.touches.len(),
                    corner.edges.len()
                )));
            }
        }

        for center in &self.centers {
            let dangling = center.corners.iter().any(|&q| q >= self.corners.len())
                || center.edges.iter().any(|&e| e >= self.edges.len());
            if dangling {
                return Err(MapError::InvariantViolation(format!(
                    "center {} references a missing corner or edge",
                    center.id
                )));
            }
            for &n in &center.neighbors {
                if !self.centers.get(n).is_some_and(|other| other.is_neighbor_of(center.id)) {
                    return Err(MapError::InvariantViolation(format!(
                        "center {} lists {} as neighbour but not the reverse",
                        center.id, n
                    )));
                }
            }
        }

        Ok(())
    }
}
