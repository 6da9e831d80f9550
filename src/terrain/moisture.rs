//! Moisture passes (8 to 10)

use std::collections::VecDeque;

use super::elevation::mean;
use super::land_corners;
use crate::graph::{CornerId, MapGraph};

/// Decay per step away from lakes and rivers
const FRESH_DECAY: f64 = 0.9;
/// Decay per step away from the ocean
const SALT_DECAY: f64 = 0.3;
/// Cap on the moisture a river seeds
const RIVER_CAP: f64 = 3.0;
const RIVER_SCALE: f64 = 0.2;

/// Pass 8: moisture by relaxation from fresh water, then from the ocean
///
/// Non-ocean water and river corners are seeded (rivers by volume, capped at
/// 3; plain water at 1) and spread with decay 0.9. Ocean corners are then
/// raised to at least 1 and spread with decay 0.3. Both relaxations only
/// overwrite a neighbour with a strictly larger value.
pub fn assign_corner_moisture(graph: &mut MapGraph) {
    let mut queue = VecDeque::new();

    for corner in &mut graph.corners {
        if (corner.water || corner.river > 0) && !corner.ocean {
            corner.moisture = if corner.river > 0 {
                (RIVER_SCALE * f64::from(corner.river)).min(RIVER_CAP)
            } else {
                1.0
            };
            queue.push_back(corner.id);
        } else {
            corner.moisture = 0.0;
        }
    }
    relax(graph, queue, FRESH_DECAY);

    let mut queue = VecDeque::new();
    for corner in graph.corners.iter_mut().filter(|q| q.ocean) {
        corner.moisture = corner.moisture.max(1.0);
        queue.push_back(corner.id);
    }
    relax(graph, queue, SALT_DECAY);
}

fn relax(graph: &mut MapGraph, mut queue: VecDeque<CornerId>, decay: f64) {
    while let Some(q) = queue.pop_front() {
        let moisture = graph.corners[q].moisture * decay;
        for i in 0..graph.corners[q].adjacent.len() {
            let s = graph.corners[q].adjacent[i];
            if moisture > graph.corners[s].moisture {
                graph.corners[s].moisture = moisture;
                queue.push_back(s);
            }
        }
    }
}

/// Pass 9: remap land corner moisture to its rank, uniform over [0, 1]
pub fn redistribute_moisture(graph: &mut MapGraph) {
    let mut land = land_corners(graph);
    land.sort_by(|&a, &b| {
        graph.corners[a]
            .moisture
            .total_cmp(&graph.corners[b].moisture)
            .then_with(|| a.cmp(&b))
    });

    let last = land.len().saturating_sub(1).max(1) as f64;
    for (rank, &q) in land.iter().enumerate() {
        graph.corners[q].moisture = rank as f64 / last;
    }
}

/// Pass 10: Center moisture is the mean of its corners, each capped at 1
pub fn assign_polygon_moisture(graph: &mut MapGraph) {
    for c in 0..graph.centers.len() {
        let corners = &graph.corners;
        let moisture = mean(graph.centers[c].corners.iter().map(|&q| corners[q].moisture.min(1.0)));
        graph.centers[c].moisture = moisture;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vector2;
    use crate::terrain::elevation::{
        assign_corner_elevations, calculate_downslopes, redistribute_elevations,
    };
    use crate::terrain::island::{assign_corner_water, assign_ocean_coast_and_land, IslandShape};
    use crate::terrain::rivers::create_rivers;
    use crate::terrain::test_support::sampled_graph;
    use crate::terrain::PerlinNoise;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn wet_island() -> MapGraph {
        let mut graph = sampled_graph(240.0, 8.0, 64);
        let size = Vector2::new(240.0, 240.0);
        assign_corner_water(&mut graph, &IslandShape::default(), size, &PerlinNoise::new(64), 1.0);
        assign_ocean_coast_and_land(&mut graph, 0.3);
        assign_corner_elevations(&mut graph);
        redistribute_elevations(&mut graph);
        calculate_downslopes(&mut graph);
        create_rivers(&mut graph, 120, &mut ChaCha8Rng::seed_from_u64(64));
        graph
    }

    #[test]
    fn test_sources_and_ocean_are_wet() {
        let mut graph = wet_island();
        assign_corner_moisture(&mut graph);
        for q in &graph.corners {
            if q.ocean || (q.water && q.river == 0) {
                assert!(q.moisture >= 1.0);
            }
            if q.river > 0 && !q.ocean {
                assert!(q.moisture >= (0.2 * f64::from(q.river)).min(3.0));
            }
            assert!(q.moisture <= RIVER_CAP);
        }
    }

    #[test]
    fn test_relaxation_reaches_fixed_point() {
        let mut graph = wet_island();
        assign_corner_moisture(&mut graph);
        for q in &graph.corners {
            for &s in &q.adjacent {
                assert!(graph.corners[s].moisture >= q.moisture * SALT_DECAY - 1e-12);
            }
        }
    }

    #[test]
    fn test_moisture_decays_inland() {
        let mut graph = sampled_graph(200.0, 8.0, 9);
        for q in 0..graph.corners.len() {
            let hull = graph.corners[q].edges.iter().any(|&e| graph.edges[e].is_open());
            let corner = &mut graph.corners[q];
            corner.border = hull;
            corner.water = hull;
            corner.ocean = hull;
        }
        assign_corner_moisture(&mut graph);

        let border_adjacent = graph
            .corners
            .iter()
            .filter(|q| !q.border && q.adjacent.iter().any(|&s| graph.corners[s].border));
        for q in border_adjacent {
            assert!((q.moisture - SALT_DECAY).abs() < 1e-12);
        }
    }

    #[test]
    fn test_redistribution_is_uniform_and_rank_preserving() {
        let mut graph = wet_island();
        assign_corner_moisture(&mut graph);
        let before: Vec<f64> = graph.corners.iter().map(|q| q.moisture).collect();
        redistribute_moisture(&mut graph);

        let mut land: Vec<_> = graph.corners.iter().filter(|q| q.is_land()).collect();
        assert!(land.len() > 1);
        land.sort_by(|a, b| a.moisture.total_cmp(&b.moisture));
        assert_eq!(land[0].moisture, 0.0);
        assert_eq!(land[land.len() - 1].moisture, 1.0);
        for pair in land.windows(2) {
            assert!(before[pair[0].id] <= before[pair[1].id]);
        }
    }

    #[test]
    fn test_single_land_corner_gets_zero() {
        let mut graph = sampled_graph(100.0, 10.0, 2);
        for corner in &mut graph.corners {
            corner.water = corner.id != 0;
            corner.moisture = 0.5;
        }
        redistribute_moisture(&mut graph);
        assert_eq!(graph.corners[0].moisture, 0.0);
    }

    #[test]
    fn test_center_moisture_is_clamped_mean() {
        let mut graph = wet_island();
        assign_corner_moisture(&mut graph);
        redistribute_moisture(&mut graph);
        assign_polygon_moisture(&mut graph);
        for c in &graph.centers {
            assert!((0.0..=1.0).contains(&c.moisture));
            let sum: f64 = c.corners.iter().map(|&q| graph.corners[q].moisture.min(1.0)).sum();
            assert!((c.moisture - sum / c.corners.len() as f64).abs() < 1e-12);
        }
    }
}
