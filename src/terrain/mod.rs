//! Terrain annotation of the polygon graph
//!
//! A fixed sequence of passes over the graph. Each pass reads only what the
//! passes before it finalized:
//!
//! 1. corner land/water from the island shape ([`island`])
//! 2. ocean, coast and lake propagation ([`island`])
//! 3. corner elevation by breadth-first relaxation from the border ([`elevation`])
//! 4. elevation redistribution ([`elevation`])
//! 5. center elevation ([`elevation`])
//! 6. downslope pointers ([`elevation`])
//! 7. rivers ([`rivers`])
//! 8. corner moisture by relaxation from fresh and salt water ([`moisture`])
//! 9. moisture redistribution ([`moisture`])
//! 10. center moisture ([`moisture`])
//! 11. biomes ([`biome`])

pub mod biome;
pub mod elevation;
pub mod island;
pub mod moisture;
mod perlin;
pub mod rivers;

pub use biome::{classify_biome, Biome, BiomeTable};
pub use island::IslandShape;
pub use perlin::{sample_perlin_fbm, PerlinConfig, PerlinNoise};

use rand::Rng;
use std::time::Instant;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};
use crate::geometry::Vector2;
use crate::graph::MapGraph;

/// Coherent noise oracle consulted by the island shape
///
/// Implementations should return values in [-1, 1] and be continuous in all
/// three coordinates. Any `Fn(f64, f64, f64) -> f64` closure is a noise field.
pub trait NoiseField {
    fn sample(&self, x: f64, y: f64, z: f64) -> f64;
}

impl<F> NoiseField for F
where
    F: Fn(f64, f64, f64) -> f64,
{
    fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        self(x, y, z)
    }
}

/// Tunables of the terrain passes
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainConfig {
    /// Fraction of water corners that turns a Center into a lake (default 0.3)
    pub lake_threshold: f64,
    /// Island shape parameters
    pub island: IslandShape,
    /// River origins drawn; `None` means `(width + height) / 4`
    pub river_attempts: Option<usize>,
    /// Settings of the default Perlin oracle
    pub perlin: PerlinConfig,
    /// Moisture × elevation biome table
    pub biomes: BiomeTable,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            lake_threshold: 0.3,
            island: IslandShape::default(),
            river_attempts: None,
            perlin: PerlinConfig::default(),
            biomes: BiomeTable::default(),
        }
    }
}

impl TerrainConfig {
    /// Number of river origins drawn for a `width × height` map
    pub fn river_attempts_for(&self, width: u32, height: u32) -> usize {
        self.river_attempts
            .unwrap_or((width as usize + height as usize) / 4)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.lake_threshold) {
            return Err(MapError::InvalidConfig(format!(
                "lake threshold must be in [0, 1] (got {})",
                self.lake_threshold
            )));
        }
        self.island.validate()
    }
}

/// Runs the terrain passes in order over one graph
pub struct TerrainPipeline<'a, N: NoiseField + ?Sized> {
    config: &'a TerrainConfig,
    size: Vector2,
    noise: &'a N,
    z: f64,
    river_attempts: usize,
}

impl<'a, N: NoiseField + ?Sized> TerrainPipeline<'a, N> {
    /// # Arguments
    ///
    /// * `config` - Terrain tunables
    /// * `width`, `height` - Map rectangle
    /// * `noise` - Island shape oracle
    /// * `z` - Depth at which the oracle is sampled
    pub fn new(config: &'a TerrainConfig, width: u32, height: u32, noise: &'a N, z: f64) -> Self {
        Self {
            config,
            size: Vector2::new(f64::from(width), f64::from(height)),
            noise,
            z,
            river_attempts: config.river_attempts_for(width, height),
        }
    }

    /// Annotate `graph` in place; `rng` only feeds river origin selection
    pub fn run<R: Rng + ?Sized>(&self, graph: &mut MapGraph, rng: &mut R) {
        let config = self.config;

        timed("corner water", || {
            island::assign_corner_water(graph, &config.island, self.size, self.noise, self.z)
        });
        timed("ocean and coast", || {
            island::assign_ocean_coast_and_land(graph, config.lake_threshold)
        });
        timed("corner elevation", || elevation::assign_corner_elevations(graph));
        timed("redistribute elevation", || elevation::redistribute_elevations(graph));
        timed("center elevation", || elevation::assign_polygon_elevations(graph));
        timed("downslopes", || elevation::calculate_downslopes(graph));
        timed("rivers", || rivers::create_rivers(graph, self.river_attempts, rng));
        timed("corner moisture", || moisture::assign_corner_moisture(graph));
        timed("redistribute moisture", || moisture::redistribute_moisture(graph));
        timed("center moisture", || moisture::assign_polygon_moisture(graph));
        timed("biomes", || biome::assign_biomes(graph, &config.biomes));
    }
}

fn timed<T>(pass: &'static str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    debug!(
        target: "poly_map::terrain",
        pass,
        elapsed_us = start.elapsed().as_micros() as u64,
        "terrain pass done"
    );
    out
}

/// Corners with `water == false`, in id order
pub(crate) fn land_corners(graph: &MapGraph) -> Vec<usize> {
    graph
        .corners
        .iter()
        .filter(|q| q.is_land())
        .map(|q| q.id)
        .collect()
}
