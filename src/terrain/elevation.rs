//! Elevation passes (3 to 6)

use std::collections::VecDeque;

use super::land_corners;
use crate::graph::MapGraph;

/// Cost of a step that stays on land
const LAND_STEP: f64 = 1.0;
/// Cost of a step touching water
const WATER_STEP: f64 = 0.01;
/// Skew of the redistributed elevation curve
const SCALE_FACTOR: f64 = 1.05;

/// Pass 3: distance-like elevation from the border
///
/// Breadth-first relaxation from the border corners (elevation 0). A step
/// between two land corners costs 1, any other step 0.01, so elevation
/// counts land steps from the sea. A corner is only updated when its value
/// strictly improves. Water corners are flattened to 0 afterwards; corners
/// the relaxation never reaches keep `f64::INFINITY` until redistribution.
pub fn assign_corner_elevations(graph: &mut MapGraph) {
    let mut queue = VecDeque::new();

    for corner in &mut graph.corners {
        if corner.border {
            corner.elevation = 0.0;
            queue.push_back(corner.id);
        } else {
            corner.elevation = f64::INFINITY;
        }
    }

    while let Some(q) = queue.pop_front() {
        for i in 0..graph.corners[q].adjacent.len() {
            let s = graph.corners[q].adjacent[i];
            let step = if !graph.corners[q].water && !graph.corners[s].water {
                LAND_STEP
            } else {
                WATER_STEP
            };
            let elevation = graph.corners[q].elevation + step;
            if elevation < graph.corners[s].elevation {
                graph.corners[s].elevation = elevation;
                queue.push_back(s);
            }
        }
    }

    for corner in graph.corners.iter_mut().filter(|q| q.water) {
        corner.elevation = 0.0;
    }
}

/// Pass 4: remap land corner elevations by rank
///
/// The corner of rank `i` out of `n` (ascending) gets
/// `1 - sqrt(1.05 · (1 - i/n))`, clamped to [0, 1]. Only the order of the
/// relaxed values matters; ties keep id order.
pub fn redistribute_elevations(graph: &mut MapGraph) {
    let mut land = land_corners(graph);
    land.sort_by(|&a, &b| {
        graph.corners[a]
            .elevation
            .total_cmp(&graph.corners[b].elevation)
            .then_with(|| a.cmp(&b))
    });

    let n = land.len() as f64;
    for (rank, &q) in land.iter().enumerate() {
        let y = rank as f64 / n;
        let x = 1.0 - (SCALE_FACTOR * (1.0 - y)).sqrt();
        graph.corners[q].elevation = x.clamp(0.0, 1.0);
    }
}

/// Pass 5: Center elevation is the mean of its corners
pub fn assign_polygon_elevations(graph: &mut MapGraph) {
    for c in 0..graph.centers.len() {
        let corners = &graph.corners;
        let elevation = mean(graph.centers[c].corners.iter().map(|&q| corners[q].elevation));
        graph.centers[c].elevation = elevation;
    }
}

/// Pass 6: point every corner at its strictly lowest neighbour, or itself
pub fn calculate_downslopes(graph: &mut MapGraph) {
    for q in 0..graph.corners.len() {
        let corners = &graph.corners;
        let lowest = corners[q].adjacent.iter().fold(q, |low, &s| {
            if corners[s].elevation < corners[low].elevation {
                s
            } else {
                low
            }
        });
        graph.corners[q].downslope = Some(lowest);
    }
}

pub(crate) fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
