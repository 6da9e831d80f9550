//! River tracing (pass 7)
//!
//! Rivers start at random mid-elevation corners and follow the downslope
//! pointers to the coast. A river's flow grows by one unit per step, and each
//! corner and edge it passes adds the flow it carries there. Where rivers
//! merge their volumes add up.

use rand::Rng;
use tracing::trace;

use crate::graph::{CornerId, MapGraph};

/// River sources must lie in this elevation band
pub const SOURCE_ELEVATION: std::ops::RangeInclusive<f64> = 0.3..=0.9;

/// Draw `attempts` random corners and trace a river from every eligible one
///
/// Ocean, border and out-of-band corners are skipped, so fewer than
/// `attempts` rivers may be created.
///
/// # Returns
///
/// The number of rivers traced
pub fn create_rivers<R: Rng + ?Sized>(graph: &mut MapGraph, attempts: usize, rng: &mut R) -> usize {
    if graph.corners.is_empty() {
        return 0;
    }

    let mut rivers = 0;
    for _ in 0..attempts {
        let q = rng.gen_range(0..graph.corners.len());
        let origin = &graph.corners[q];
        if origin.ocean || origin.border || !SOURCE_ELEVATION.contains(&origin.elevation) {
            continue;
        }
        let length = trace_river(graph, q);
        trace!(target: "poly_map::terrain", origin = q, length, "river");
        rivers += 1;
    }
    rivers
}

/// Follow downslope from `origin` until a coast corner or a local minimum
fn trace_river(graph: &mut MapGraph, origin: CornerId) -> usize {
    let mut flow = 1;
    let mut current = origin;
    graph.corners[origin].river += flow;

    // downslope strictly descends, so the walk visits each corner at most once
    for step in 0..graph.corners.len() {
        if graph.corners[current].coast {
            return step;
        }
        let next = match graph.corners[current].downslope {
            Some(next) if next != current => next,
            _ => return step,
        };
        let edge = graph.find_corner_edge(current, next);
        debug_assert!(
            edge.is_some(),
            "downslope of corner {} is {}, which shares no edge with it",
            current,
            next
        );
        let Some(edge) = edge else {
            return step;
        };

        graph.edges[edge].river += flow;
        flow += 1;
        graph.corners[next].river += flow;
        current = next;
    }
    graph.corners.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vector2;
    use crate::terrain::elevation::{
        assign_corner_elevations, calculate_downslopes, redistribute_elevations,
    };
    use crate::terrain::island::{assign_corner_water, assign_ocean_coast_and_land, IslandShape};
    use crate::terrain::test_support::{flat_high, sampled_graph};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sloped_island() -> MapGraph {
        let mut graph = sampled_graph(240.0, 8.0, 55);
        let size = Vector2::new(240.0, 240.0);
        assign_corner_water(&mut graph, &IslandShape::default(), size, &flat_high, 0.0);
        assign_ocean_coast_and_land(&mut graph, 0.3);
        assign_corner_elevations(&mut graph);
        redistribute_elevations(&mut graph);
        calculate_downslopes(&mut graph);
        graph
    }

    #[test]
    fn test_rivers_are_created() {
        let mut graph = sloped_island();
        let created = create_rivers(&mut graph, 200, &mut ChaCha8Rng::seed_from_u64(1));
        assert!(created > 0);
        assert!(graph.corners.iter().any(|q| q.river > 0));
        assert!(graph.edges.iter().any(|e| e.river > 0));
    }

    #[test]
    fn test_volume_increases_downstream() {
        let mut graph = sloped_island();
        create_rivers(&mut graph, 300, &mut ChaCha8Rng::seed_from_u64(2));

        for q in graph.corners.iter().filter(|q| q.river > 0) {
            if q.coast {
                continue;
            }
            let next = q.downslope.unwrap();
            if next == q.id {
                continue;
            }
            assert!(
                graph.corners[next].river > q.river,
                "corner {} carries {} but {} downstream carries {}",
                q.id,
                q.river,
                next,
                graph.corners[next].river
            );
        }
    }

    #[test]
    fn test_river_edges_join_river_corners() {
        let mut graph = sloped_island();
        create_rivers(&mut graph, 100, &mut ChaCha8Rng::seed_from_u64(3));
        for edge in graph.edges.iter().filter(|e| e.river > 0) {
            let (a, b) = edge.corners().unwrap();
            assert!(graph.corners[a].river > 0 && graph.corners[b].river > 0);
        }
    }

    #[test]
    fn test_no_attempts_no_rivers() {
        let mut graph = sloped_island();
        assert_eq!(create_rivers(&mut graph, 0, &mut ChaCha8Rng::seed_from_u64(4)), 0);
        assert!(graph.corners.iter().all(|q| q.river == 0));
    }

    #[test]
    fn test_sources_respect_band() {
        let mut graph = sloped_island();
        for corner in &mut graph.corners {
            corner.elevation = corner.elevation.min(0.2);
        }
        assert_eq!(create_rivers(&mut graph, 100, &mut ChaCha8Rng::seed_from_u64(5)), 0);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "shares no edge")]
    fn test_downslope_without_edge_panics_in_debug() {
        let mut graph = sloped_island();
        let q = graph.corners.iter().position(|q| !q.coast).unwrap();
        let far = (0..graph.corners.len())
            .find(|&r| r != q && !graph.corners[q].adjacent.contains(&r))
            .unwrap();
        graph.corners[q].downslope = Some(far);
        trace_river(&mut graph, q);
    }
}
