//! Dual graph construction from a Delaunay triangulation
//!
//! Every triangulation vertex becomes a Center, every triangle becomes a
//! Corner at its circumcenter, and every triangle side becomes an Edge
//! between the two Centers it joins. An Edge is created the first time a
//! Center pair is seen and completed by the second triangle sharing it.

use std::collections::HashMap;

use tracing::debug;

use super::delaunay::Triangulation;
use crate::error::{MapError, Result};
use crate::graph::{CenterId, EdgeId, MapGraph};

/// Builds a [`MapGraph`] from a [`Triangulation`]
pub struct GraphBuilder;

impl GraphBuilder {
    /// Convert a triangulation into the Center/Corner/Edge graph
    ///
    /// Centers are numbered in the order their vertices are first met while
    /// walking the triangles, so the same triangulation always yields the
    /// same ids.
    ///
    /// # Returns
    ///
    /// The finished graph, with neighbour lists and angular corner order, or
    /// [`MapError::DegenerateGeometry`] for an empty triangulation.
    pub fn build(triangulation: &Triangulation) -> Result<MapGraph> {
        if triangulation.is_empty() {
            return Err(MapError::DegenerateGeometry(format!(
                "no triangles over {} unique points",
                triangulation.vertices.len()
            )));
        }

        let mut graph = MapGraph::new();
        let mut center_of_vertex: Vec<Option<CenterId>> = vec![None; triangulation.vertices.len()];
        let mut edge_of_pair: HashMap<(CenterId, CenterId), EdgeId> = HashMap::new();

        for triangle in &triangulation.triangles {
            let corner = graph.add_corner(triangle.circumcenter);

            let centers = triangle.vertices.map(|v| {
                *center_of_vertex[v]
                    .get_or_insert_with(|| graph.add_center(triangulation.vertices[v].position()))
            });

            for &c in &centers {
                graph.corners[corner].touches.push(c);
                graph.centers[c].corners.push(corner);
            }

            for i in 0..3 {
                let (a, b) = (centers[i], centers[(i + 1) % 3]);
                let key = (a.min(b), a.max(b));
                let edge = match edge_of_pair.get(&key) {
                    Some(&e) => {
                        if graph.edges[e].v1.is_some() {
                            return Err(MapError::InvariantViolation(format!(
                                "centers {} and {} share more than two triangles",
                                a, b
                            )));
                        }
                        graph.edges[e].v1 = Some(corner);
                        e
                    }
                    None => {
                        let e = graph.add_edge(a, b);
                        graph.edges[e].v0 = Some(corner);
                        edge_of_pair.insert(key, e);
                        e
                    }
                };
                graph.corners[corner].edges.push(edge);
            }
        }

        graph.finish();

        debug!(
            target: "poly_map::generation",
            centers = graph.centers.len(),
            corners = graph.corners.len(),
            edges = graph.edges.len(),
            "built dual graph"
        );

        Ok(graph)
    }
}
