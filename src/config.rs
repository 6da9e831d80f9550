//! Map configuration and builder
//!
//! Everything needed to regenerate a map deterministically: the rectangle,
//! the point spacing, the seed string and the terrain tunables.

use std::collections::hash_map::DefaultHasher;
use std::f64::consts::PI;
use std::hash::{Hash, Hasher};

use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::info;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};
use crate::terrain::TerrainConfig;

/// Length of a generated seed string
pub const GENERATED_SEED_LEN: usize = 20;

/// Deepest region quadtree accepted
pub const MAX_REGION_DEPTH: usize = 12;

/// Configuration for deterministic map generation
///
/// The same configuration always produces the identical map: same points,
/// same graph ids, same terrain.
///
/// # Example
///
/// ```rust
/// use poly_map::*;
///
/// let config = MapConfigBuilder::new()
///     .size(400, 300)
///     .unwrap()
///     .min_distance(12.0)
///     .unwrap()
///     .seed("coastline")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.seed, "coastline");
/// assert_eq!(config.seed_hash(), config.clone().seed_hash());
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    /// Map width in world units
    pub width: u32,
    /// Map height in world units
    pub height: u32,
    /// Minimum separation between sampled points
    pub min_distance: f64,
    /// Seed string; hashed to the 32-bit seed of all randomness
    pub seed: String,
    /// Candidates tried around each active sample before it retires
    pub sample_attempts: usize,
    /// Upper bound on the expected number of points
    pub max_points: usize,
    /// Region quadtree depth; derived from the point density when `None`
    pub region_depth: Option<usize>,
    /// Terrain pass tunables
    pub terrain: TerrainConfig,
}

impl MapConfig {
    /// 32-bit hash of the seed string
    pub fn seed_hash(&self) -> u32 {
        hash_seed(&self.seed)
    }

    /// Replace an empty seed with a freshly generated one
    ///
    /// The generated seed is reported with an `info` event.
    ///
    /// # Returns
    ///
    /// `true` if a seed was generated
    pub fn ensure_seed(&mut self) -> bool {
        if !self.seed.is_empty() {
            return false;
        }
        self.seed = generate_seed();
        info!(target: "poly_map::config", seed = %self.seed, "generated seed");
        true
    }

    /// Expected Poisson sample count, `2·w·h / (π·d²)`
    pub fn expected_point_count(&self) -> f64 {
        let area = f64::from(self.width) * f64::from(self.height);
        2.0 * area / (PI * self.min_distance * self.min_distance)
    }

    /// Region quadtree depth: the override, or `round(log4(expected points))`
    pub fn region_depth(&self) -> usize {
        self.region_depth.unwrap_or_else(|| {
            let depth = (self.expected_point_count().max(1.0).log(4.0) + 0.5).floor();
            (depth as usize).clamp(1, MAX_REGION_DEPTH)
        })
    }

    /// Check every field and the relations between them
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a zero-sized map, a non-positive or
    /// non-finite spacing, a spacing that leaves no room for three points,
    /// an expected point count above `max_points`, or invalid terrain tunables.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MapError::InvalidConfig(format!(
                "map size must be positive (got {}x{})",
                self.width, self.height
            )));
        }
        if !self.min_distance.is_finite() || self.min_distance <= 0.0 {
            return Err(MapError::InvalidConfig(format!(
                "minimum distance must be positive and finite (got {})",
                self.min_distance
            )));
        }
        if self.min_distance >= f64::from(self.width.max(self.height)) {
            return Err(MapError::InvalidConfig(format!(
                "minimum distance {} leaves no room for a triangle in {}x{}",
                self.min_distance, self.width, self.height
            )));
        }
        if self.sample_attempts == 0 {
            return Err(MapError::InvalidConfig("sample attempts must be at least 1".into()));
        }
        let expected = self.expected_point_count();
        if expected > self.max_points as f64 {
            return Err(MapError::InvalidConfig(format!(
                "about {:.0} points expected, more than the limit of {}",
                expected, self.max_points
            )));
        }
        if let Some(depth) = self.region_depth {
            check_region_depth(depth)?;
        }
        self.terrain.validate()
    }
}

/// Hash a seed string to the 32-bit generator seed
pub fn hash_seed(seed: &str) -> u32 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    let h = hasher.finish();
    (h ^ (h >> 32)) as u32
}

/// Fresh alphanumeric seed string
pub fn generate_seed() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_SEED_LEN)
        .map(char::from)
        .collect()
}

fn check_region_depth(depth: usize) -> Result<()> {
    if depth > MAX_REGION_DEPTH {
        return Err(MapError::InvalidConfig(format!(
            "region depth must be <= {} (got {})",
            MAX_REGION_DEPTH, depth
        )));
    }
    Ok(())
}

/// Builder for [`MapConfig`] with validation
///
/// # Example
///
/// ```rust
/// use poly_map::*;
///
/// // Defaults: 800x600, spacing 10, random seed
/// let config = MapConfigBuilder::new().build().unwrap();
/// assert_eq!(config.seed.len(), 20);
///
/// // Customize
/// let config = MapConfigBuilder::new()
///     .size(1024, 768)
///     .unwrap()
///     .min_distance(8.0)
///     .unwrap()
///     .sample_attempts(20)
///     .unwrap()
///     .seed("TEST")
///     .build()
///     .unwrap();
/// assert_eq!(config.width, 1024);
/// ```
#[derive(Debug, Clone)]
pub struct MapConfigBuilder {
    width: u32,
    height: u32,
    min_distance: f64,
    seed: Option<String>,
    sample_attempts: usize,
    max_points: usize,
    region_depth: Option<usize>,
    terrain: TerrainConfig,
}

impl MapConfigBuilder {
    /// Create a new builder with default values
    ///
    /// Defaults:
    /// - size: 800 × 600
    /// - min_distance: 10
    /// - seed: random 20-character string, generated at `build`
    /// - sample_attempts: 30
    /// - max_points: 200 000
    /// - region_depth: derived from the point density
    pub fn new() -> Self {
        Self {
            width: 800,
            height: 600,
            min_distance: 10.0,
            seed: None,
            sample_attempts: 30,
            max_points: 200_000,
            region_depth: None,
            terrain: TerrainConfig::default(),
        }
    }

    /// Set the map rectangle
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if either side is zero
    pub fn size(mut self, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(MapError::InvalidConfig(format!(
                "map size must be positive (got {}x{})",
                width, height
            )));
        }
        self.width = width;
        self.height = height;
        Ok(self)
    }

    /// Set the minimum point separation
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the distance is not a positive finite number
    pub fn min_distance(mut self, distance: f64) -> Result<Self> {
        if !distance.is_finite() || distance <= 0.0 {
            return Err(MapError::InvalidConfig(format!(
                "minimum distance must be positive and finite (got {})",
                distance
            )));
        }
        self.min_distance = distance;
        Ok(self)
    }

    /// Set the seed string
    ///
    /// An empty string asks for a generated seed, like not calling this at all.
    pub fn seed(mut self, seed: impl Into<String>) -> Self {
        let seed = seed.into();
        self.seed = if seed.is_empty() { None } else { Some(seed) };
        self
    }

    /// Set the per-point retry budget of the sampler
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `attempts` is 0
    pub fn sample_attempts(mut self, attempts: usize) -> Result<Self> {
        if attempts == 0 {
            return Err(MapError::InvalidConfig("sample attempts must be at least 1".into()));
        }
        self.sample_attempts = attempts;
        Ok(self)
    }

    /// Set the bound on the expected point count
    pub fn max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }

    /// Fix the region quadtree depth instead of deriving it
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if depth exceeds [`MAX_REGION_DEPTH`]
    pub fn region_depth(mut self, depth: usize) -> Result<Self> {
        check_region_depth(depth)?;
        self.region_depth = Some(depth);
        Ok(self)
    }

    /// Replace the terrain tunables
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the tunables are out of range
    pub fn terrain(mut self, terrain: TerrainConfig) -> Result<Self> {
        terrain.validate()?;
        self.terrain = terrain;
        Ok(self)
    }

    /// Build and validate the configuration
    ///
    /// If no seed was provided, a fresh one is generated and reported.
    pub fn build(self) -> Result<MapConfig> {
        let mut config = MapConfig {
            width: self.width,
            height: self.height,
            min_distance: self.min_distance,
            seed: self.seed.unwrap_or_default(),
            sample_attempts: self.sample_attempts,
            max_points: self.max_points,
            region_depth: self.region_depth,
            terrain: self.terrain,
        };
        config.ensure_seed();
        config.validate()?;
        Ok(config)
    }
}

impl Default for MapConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
