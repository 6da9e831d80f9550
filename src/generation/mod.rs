//! Point sampling, triangulation and dual graph construction
//!
//! Geometry stage of map generation: scatter blue-noise sites, triangulate
//! them with Bowyer–Watson, then turn the triangles into the
//! Center/Corner/Edge graph the terrain passes annotate.

pub mod delaunay;
mod poisson;
mod voronoi;

pub use delaunay::{triangulate, Triangle, Triangulation, Vertex};
pub use poisson::PoissonDiskSampler;
pub use voronoi::GraphBuilder;

use rand::Rng;
use std::time::Instant;
use tracing::debug;

use crate::config::MapConfig;
use crate::error::{MapError, Result};
use crate::graph::MapGraph;

/// Output of the geometry stage
#[derive(Debug, Clone)]
pub struct RawGraph {
    pub graph: MapGraph,
    /// Number of sampled sites
    pub point_count: usize,
    /// Number of triangles, equal to the Corner count
    pub triangle_count: usize,
    /// Edge flips applied after construction
    pub flips: usize,
}

/// Sample, triangulate and build the dual graph for a configuration
///
/// `rng` is the map's single random stream; only the sampler draws from it.
pub fn generate_raw_graph<R: Rng + ?Sized>(config: &MapConfig, rng: &mut R) -> Result<RawGraph> {
    let start = Instant::now();
    let sampler = PoissonDiskSampler::new(
        f64::from(config.width),
        f64::from(config.height),
        config.min_distance,
        config.sample_attempts,
    );
    let points = sampler.generate(rng);
    debug!(
        target: "poly_map::generation",
        points = points.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "sampled points"
    );

    if points.len() < 3 {
        return Err(MapError::DegenerateGeometry(format!(
            "only {} points fit in {}x{} at distance {}",
            points.len(),
            config.width,
            config.height,
            config.min_distance
        )));
    }

    let start = Instant::now();
    let triangulation = triangulate(&points);
    debug!(
        target: "poly_map::generation",
        triangles = triangulation.triangle_count(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "triangulated"
    );

    let mut graph = GraphBuilder::build(&triangulation)?;
    let flips = graph.legalize_all();
    graph.validate()?;

    Ok(RawGraph {
        graph,
        point_count: points.len(),
        triangle_count: triangulation.triangle_count(),
        flips,
    })
}
