//! Island shape and water classification (passes 1 and 2)

use std::collections::VecDeque;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::NoiseField;
use crate::error::{MapError, Result};
use crate::geometry::Vector2;
use crate::graph::MapGraph;

/// Radial noise island
///
/// A point is land when the noise sampled at its scaled offset from the map
/// centre beats a threshold that grows with the distance from that centre,
/// so land thins out towards the edges.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IslandShape {
    /// Fraction of the map size on every side that is always water
    pub edge_margin: f64,
    /// Noise coordinates span `[-scale/2, scale/2]` across the map
    pub noise_scale: f64,
    /// Weight of the radial term in the land threshold
    pub falloff: f64,
    /// Radius (relative to the shorter side) where the threshold crosses the falloff line
    pub radius_offset: f64,
}

impl Default for IslandShape {
    fn default() -> Self {
        Self {
            edge_margin: 0.075,
            noise_scale: 4.0,
            falloff: 0.3,
            radius_offset: 0.5,
        }
    }
}

impl IslandShape {
    /// Land test for a point of a `size` map
    pub fn is_land<N>(&self, p: Vector2, size: Vector2, noise: &N, z: f64) -> bool
    where
        N: NoiseField + ?Sized,
    {
        let margin = size * self.edge_margin;
        if p.x < margin.x || p.y < margin.y || p.x > size.x - margin.x || p.y > size.y - margin.y {
            return false;
        }

        let offset = p - size * 0.5;
        let coord = offset / size * self.noise_scale;
        let value = noise.sample(coord.x, coord.y, z);
        let r = offset.length() / size.x.min(size.y);
        value >= self.falloff * r + (r - self.radius_offset)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(0.0..0.5).contains(&self.edge_margin) {
            return Err(MapError::InvalidConfig(format!(
                "island edge margin must be in [0, 0.5) (got {})",
                self.edge_margin
            )));
        }
        if !self.noise_scale.is_finite() || self.noise_scale <= 0.0 {
            return Err(MapError::InvalidConfig(format!(
                "island noise scale must be positive (got {})",
                self.noise_scale
            )));
        }
        Ok(())
    }
}

/// Pass 1: border and land/water per Corner
///
/// Corners outside the map rectangle or on the triangulation hull are border
/// ocean. Every other Corner asks the island shape.
pub fn assign_corner_water<N: NoiseField + ?Sized>(
    graph: &mut MapGraph,
    shape: &IslandShape,
    size: Vector2,
    noise: &N,
    z: f64,
) {
    for q in 0..graph.corners.len() {
        let hull = graph.corners[q]
            .edges
            .iter()
            .any(|&e| graph.edges[e].is_open());
        let p = graph.corners[q].position;
        let outside = p.x < 0.0 || p.y < 0.0 || p.x > size.x || p.y > size.y;

        let corner = &mut graph.corners[q];
        if outside || hull {
            corner.border = true;
            corner.ocean = true;
            corner.water = true;
        } else {
            corner.border = false;
            corner.ocean = false;
            corner.water = !shape.is_land(p, size, noise, z);
        }
    }
}

/// Pass 2: ocean, lakes and coast for Centers, then Corners
///
/// Centers touching the border seed a flood fill that turns every connected
/// water Center into ocean; water that the flood never reaches is a lake.
pub fn assign_ocean_coast_and_land(graph: &mut MapGraph, lake_threshold: f64) {
    let mut queue = VecDeque::new();

    for c in 0..graph.centers.len() {
        let corners = &graph.corners;
        let center = &graph.centers[c];
        let border = center.corners.iter().any(|&q| corners[q].border);
        let num_water = center.corners.iter().filter(|&&q| corners[q].water).count();
        let water = border || num_water as f64 >= center.corners.len() as f64 * lake_threshold;

        let center = &mut graph.centers[c];
        center.border = border;
        center.ocean = border;
        center.water = water;
        if border {
            queue.push_back(c);
        }
    }

    while let Some(c) = queue.pop_front() {
        for i in 0..graph.centers[c].neighbors.len() {
            let n = graph.centers[c].neighbors[i];
            let neighbor = &mut graph.centers[n];
            if neighbor.water && !neighbor.ocean {
                neighbor.ocean = true;
                queue.push_back(n);
            }
        }
    }

    for c in 0..graph.centers.len() {
        let centers = &graph.centers;
        let neighbors = &centers[c].neighbors;
        let touches_ocean = neighbors.iter().any(|&n| centers[n].ocean);
        let touches_land = neighbors.iter().any(|&n| !centers[n].water);
        graph.centers[c].coast = touches_ocean && touches_land;
    }

    for q in 0..graph.corners.len() {
        let centers = &graph.centers;
        let touches = &graph.corners[q].touches;
        let num_ocean = touches.iter().filter(|&&c| centers[c].ocean).count();
        let num_land = touches.iter().filter(|&&c| !centers[c].water).count();
        let all = touches.len();

        let corner = &mut graph.corners[q];
        corner.ocean = num_ocean == all;
        corner.coast = num_ocean > 0 && num_land > 0;
        corner.water = corner.border || (num_land != all && !corner.coast);
    }
}
