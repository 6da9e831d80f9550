//! Polygonal terrain map generation
//!
//! Scatters blue-noise sites over a rectangle, builds the Delaunay
//! triangulation and its dual polygon graph, then annotates the polygons with
//! elevation, rivers, moisture and biomes. The result is a plain arena graph
//! a renderer or world loader can walk.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use poly_map::*;
//!
//! // Generate a map
//! let config = MapConfigBuilder::new()
//!     .size(800, 600).unwrap()
//!     .min_distance(10.0).unwrap()
//!     .seed("TEST")
//!     .build().unwrap();
//!
//! let map = PolyMap::generate(config).unwrap();
//!
//! // Walk the polygons
//! for center in map.centers() {
//!     println!("{:?} at {}", center.biome, center.position);
//! }
//!
//! // Look up the polygon under a point
//! let here = map.get_center_at(Vector2::new(400.0, 300.0));
//! ```
//!
//! # Features
//!
//! - `serde`: Enables serialization support for configuration and the graph

// Modules
pub mod error;
pub mod config;
pub mod geometry;
pub mod generation;
pub mod graph;
pub mod spatial;
pub mod terrain;
pub mod map;

// Re-export core types for convenience
pub use error::{MapError, Result};
pub use config::{MapConfig, MapConfigBuilder};
pub use geometry::{LineEquation, Vector2};
pub use graph::{Center, CenterId, Corner, CornerId, Edge, EdgeId, MapGraph};
pub use map::PolyMap;
pub use spatial::RegionIndex;
pub use terrain::{
    Biome, BiomeTable, IslandShape, NoiseField, PerlinConfig, PerlinNoise, TerrainConfig,
};
