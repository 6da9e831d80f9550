//! PolyMap main structure

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::MapConfig;
use crate::error::Result;
use crate::generation::generate_raw_graph;
use crate::geometry::{Aabb, Vector2};
use crate::graph::{Center, CenterId, Corner, CornerId, Edge, EdgeId, MapGraph};
use crate::spatial::RegionIndex;
use crate::terrain::{NoiseField, PerlinNoise, TerrainPipeline};

/// Range of the noise depth drawn for each map
const NOISE_DEPTH: f64 = 256.0;

/// A complete, annotated polygon map
///
/// Owns the Center/Corner/Edge graph and a region index over the Center
/// polygons. The graph is immutable once generation returns.
///
/// # Examples
///
/// ```
/// use poly_map::*;
///
/// let config = MapConfigBuilder::new()
///     .size(200, 150)
///     .unwrap()
///     .seed("TEST")
///     .build()
///     .unwrap();
///
/// let map = PolyMap::generate(config).unwrap();
/// println!("Generated {} polygons", map.centers().len());
///
/// if let Some(center) = map.get_center_at(Vector2::new(100.0, 75.0)) {
///     println!("Biome at the middle: {:?}", center.biome);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PolyMap {
    /// Configuration used to generate this map
    config: MapConfig,

    /// Cached hash of the seed string
    seed_hash: u32,

    graph: MapGraph,

    /// Center bounding boxes for point lookups
    index: RegionIndex,

    point_count: usize,
    triangle_count: usize,
}

impl PolyMap {
    /// Generate a map with the default Perlin island oracle
    ///
    /// # Arguments
    ///
    /// * `config` - Map configuration (size, spacing, seed, terrain)
    ///
    /// # Returns
    ///
    /// `Result<PolyMap>` - Generated map or error. An empty seed is replaced
    /// by a generated one, readable afterwards through [`PolyMap::seed`].
    pub fn generate(mut config: MapConfig) -> Result<Self> {
        config.ensure_seed();
        let noise = PerlinNoise::with_config(config.seed_hash(), config.terrain.perlin);
        Self::generate_with_noise(config, &noise)
    }

    /// Generate a map with a custom noise oracle for the island shape
    ///
    /// # Arguments
    ///
    /// * `config` - Map configuration
    /// * `noise` - Field sampled by the island test, expected in [-1, 1]
    ///
    /// # Example
    ///
    /// ```
    /// use poly_map::*;
    ///
    /// let config = MapConfigBuilder::new().size(120, 120).unwrap().seed("flat").build().unwrap();
    /// let everywhere = |_x: f64, _y: f64, _z: f64| 1.0;
    /// let map = PolyMap::generate_with_noise(config, &everywhere).unwrap();
    /// assert!(map.centers().iter().any(|c| !c.water));
    /// ```
    pub fn generate_with_noise<N>(mut config: MapConfig, noise: &N) -> Result<Self>
    where
        N: NoiseField + ?Sized,
    {
        config.ensure_seed();
        config.validate()?;
        let start = Instant::now();
        let seed_hash = config.seed_hash();
        let mut rng = ChaCha8Rng::seed_from_u64(u64::from(seed_hash));
        let z = rng.gen::<f64>() * NOISE_DEPTH;

        let raw = generate_raw_graph(&config, &mut rng)?;
        let mut graph = raw.graph;

        let pipeline = TerrainPipeline::new(&config.terrain, config.width, config.height, noise, z);
        pipeline.run(&mut graph, &mut rng);

        let index = build_index(&config, &graph);
        info!(
            target: "poly_map::map",
            seed = %config.seed,
            seed_hash,
            points = raw.point_count,
            triangles = raw.triangle_count,
            flips = raw.flips,
            centers = graph.centers.len(),
            corners = graph.corners.len(),
            edges = graph.edges.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "map generated"
        );

        Ok(Self {
            config,
            seed_hash,
            graph,
            index,
            point_count: raw.point_count,
            triangle_count: raw.triangle_count,
        })
    }

    /// Rebuild a map from a stored graph
    ///
    /// The graph is validated and the region index rebuilt; terrain
    /// attributes are taken as stored.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a bad configuration, `InvariantViolation` for an
    /// inconsistent graph.
    pub fn from_graph(config: MapConfig, graph: MapGraph) -> Result<Self> {
        config.validate()?;
        graph.validate()?;
        let index = build_index(&config, &graph);
        Ok(Self {
            seed_hash: config.seed_hash(),
            point_count: graph.centers.len(),
            triangle_count: graph.corners.len(),
            config,
            graph,
            index,
        })
    }

    #[inline]
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    #[inline]
    pub fn seed(&self) -> &str {
        &self.config.seed
    }

    #[inline]
    pub fn seed_hash(&self) -> u32 {
        self.seed_hash
    }

    #[inline]
    pub fn graph(&self) -> &MapGraph {
        &self.graph
    }

    /// Consume the map, keeping only its graph
    pub fn into_graph(self) -> MapGraph {
        self.graph
    }

    #[inline]
    pub fn centers(&self) -> &[Center] {
        &self.graph.centers
    }

    #[inline]
    pub fn corners(&self) -> &[Corner] {
        &self.graph.corners
    }

    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.graph.edges
    }

    /// Get a Center by id, `None` if out of range
    #[inline]
    pub fn center(&self, id: CenterId) -> Option<&Center> {
        self.graph.centers.get(id)
    }

    #[inline]
    pub fn corner(&self, id: CornerId) -> Option<&Corner> {
        self.graph.corners.get(id)
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.graph.edges.get(id)
    }

    /// Number of sampled sites
    #[inline]
    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Number of Delaunay triangles
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangle_count
    }

    /// Polygon outline of a Center, empty for an unknown id
    pub fn center_polygon(&self, id: CenterId) -> Vec<Vector2> {
        if id < self.graph.centers.len() {
            self.graph.center_polygon(id)
        } else {
            Vec::new()
        }
    }

    pub fn region_index(&self) -> &RegionIndex {
        &self.index
    }

    /// Find the polygon under a point
    ///
    /// Candidates come from the region index; the one whose site is nearest
    /// to `p` wins, ties going to the lower id.
    ///
    /// Hull Centers have open polygons: their outline stops at the last
    /// circumcenter, so their bounding box can miss parts of the map near
    /// the rectangle's edge. A point inside the map rectangle that no box
    /// covers falls back to the nearest site over all Centers.
    ///
    /// # Returns
    ///
    /// `None` for a point outside the map rectangle that no bounding box
    /// contains
    pub fn get_center_at(&self, p: Vector2) -> Option<&Center> {
        let candidates = self.index.query_point(p);
        if !candidates.is_empty() {
            return nearest_site(p, candidates.into_iter().map(|c| &self.graph.centers[c]));
        }
        if self.map_rect().contains(p) {
            return nearest_site(p, self.graph.centers.iter());
        }
        None
    }

    /// The `[0, width] × [0, height]` rectangle
    pub fn map_rect(&self) -> Aabb {
        map_rect(&self.config)
    }
}

/// Center whose site is closest to `p`, lower id on ties
fn nearest_site<'a>(p: Vector2, centers: impl Iterator<Item = &'a Center>) -> Option<&'a Center> {
    centers.min_by(|a, b| {
        a.position
            .distance_squared(p)
            .total_cmp(&b.position.distance_squared(p))
            .then_with(|| a.id.cmp(&b.id))
    })
}

fn map_rect(config: &MapConfig) -> Aabb {
    Aabb::new(
        Vector2::ZERO,
        Vector2::new(f64::from(config.width), f64::from(config.height)),
    )
}

/// Region index over every Center's bounding box
///
/// The root covers the map rectangle and every box, so hull polygons whose
/// corners fall outside the map stay queryable.
fn build_index(config: &MapConfig, graph: &MapGraph) -> RegionIndex {
    let start = Instant::now();
    let boxes: Vec<Aabb> = (0..graph.centers.len()).map(|c| graph.center_bbox(c)).collect();
    let root = boxes.iter().fold(map_rect(config), |acc, b| {
        Aabb::new(acc.min.min(b.min), acc.max.max(b.max))
    });

    let mut index = RegionIndex::new(root, config.region_depth());
    for (c, aabb) in boxes.into_iter().enumerate() {
        index.insert(c, aabb);
    }
    debug!(
        target: "poly_map::map",
        depth = index.max_depth(),
        entries = index.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "built region index"
    );
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfigBuilder;
    use crate::terrain::{classify_biome, Biome, BiomeTable};

    fn small_config(seed: &str) -> MapConfig {
        MapConfigBuilder::new()
            .size(300, 240)
            .unwrap()
            .min_distance(8.0)
            .unwrap()
            .seed(seed)
            .build()
            .unwrap()
    }

    #[test]
    fn test_map_generation_is_deterministic() {
        let config = MapConfigBuilder::new()
            .size(800, 600)
            .unwrap()
            .min_distance(10.0)
            .unwrap()
            .seed("TEST")
            .build()
            .unwrap();

        let a = PolyMap::generate(config.clone()).unwrap();
        let b = PolyMap::generate(config).unwrap();

        assert!(a.point_count() > 1000);
        assert_eq!(a.centers().len(), a.point_count());
        assert_eq!(a.corners().len(), a.triangle_count());
        assert_eq!(a.graph(), b.graph());
        assert_eq!(a.seed_hash(), b.seed_hash());
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = PolyMap::generate(small_config("alpha")).unwrap();
        let b = PolyMap::generate(small_config("beta")).unwrap();
        assert_ne!(a.graph(), b.graph());
    }

    #[test]
    fn test_graph_is_consistent() {
        let map = PolyMap::generate(small_config("consistent")).unwrap();
        assert!(map.graph().validate().is_ok());
        for edge in map.edges() {
            assert_ne!(edge.d0, edge.d1);
        }
    }

    #[test]
    fn test_border_centers_are_ocean() {
        let map = PolyMap::generate(small_config("border")).unwrap();
        for center in map.centers() {
            if center.corners.iter().any(|&q| map.corners()[q].border) {
                assert!(center.ocean && center.water && center.border, "center {}", center.id);
            }
        }
    }

    #[test]
    fn test_attribute_ranges() {
        let map = PolyMap::generate(small_config("ranges")).unwrap();
        for c in map.centers() {
            assert!((0.0..=1.0).contains(&c.elevation));
            assert!((0.0..=1.0).contains(&c.moisture));
            assert!(c.biome.is_some());
            if c.ocean {
                assert!(c.water);
            }
        }
        for q in map.corners() {
            assert!((0.0..=1.0).contains(&q.elevation));
            if q.ocean {
                assert!(q.water);
                assert_eq!(q.elevation, 0.0);
            }
        }
    }

    #[test]
    fn test_rivers_grow_downstream() {
        let map = PolyMap::generate(small_config("rivers")).unwrap();
        for q in map.corners().iter().filter(|q| q.river > 0 && !q.coast) {
            let Some(next) = q.downslope else { continue };
            if next != q.id {
                assert!(map.corners()[next].river > q.river);
            }
        }
    }

    #[test]
    fn test_biomes_follow_classification() {
        let map = PolyMap::generate(small_config("biomes")).unwrap();
        let table = BiomeTable::default();
        for c in map.centers() {
            let expected =
                classify_biome(c.ocean, c.water, c.coast, c.elevation, c.moisture, &table);
            assert_eq!(c.biome, Some(expected));
            if c.ocean {
                assert_eq!(c.biome, Some(Biome::Ocean));
            }
        }
    }

    #[test]
    fn test_get_center_at_sites() {
        let map = PolyMap::generate(small_config("lookup")).unwrap();
        for center in map.centers().iter().step_by(7) {
            let found = map.get_center_at(center.position).unwrap();
            assert_eq!(found.id, center.id);
        }
    }

    #[test]
    fn test_get_center_at_is_nearest_site() {
        let map = PolyMap::generate(small_config("nearest")).unwrap();
        let p = Vector2::new(151.3, 117.9);
        let found = map.get_center_at(p).unwrap();
        let best = map
            .centers()
            .iter()
            .map(|c| c.position.distance_squared(p))
            .fold(f64::INFINITY, f64::min);
        assert_eq!(found.position.distance_squared(p), best);
    }

    #[test]
    fn test_every_point_in_the_map_has_a_center() {
        let map = PolyMap::generate(small_config("coverage")).unwrap();
        let mut misses = 0;
        for i in 0..=60 {
            for j in 0..=48 {
                let p = Vector2::new(f64::from(i) * 5.0, f64::from(j) * 5.0);
                if map.get_center_at(p).is_none() {
                    misses += 1;
                }
            }
        }
        assert_eq!(misses, 0);
    }

    #[test]
    fn test_empty_seed_is_replaced() {
        let mut config = small_config("x");
        config.seed = String::new();

        let a = PolyMap::generate(config.clone()).unwrap();
        let b = PolyMap::generate(config.clone()).unwrap();
        assert_eq!(a.seed().len(), crate::config::GENERATED_SEED_LEN);
        assert_ne!(a.seed(), b.seed());
        assert_eq!(a.seed_hash(), a.config().seed_hash());

        let flat = |_x: f64, _y: f64, _z: f64| 1.0;
        let c = PolyMap::generate_with_noise(config, &flat).unwrap();
        assert!(!c.seed().is_empty());
    }

    #[test]
    fn test_get_center_outside_map() {
        let map = PolyMap::generate(small_config("outside")).unwrap();
        assert!(map.get_center_at(Vector2::new(-1.0e6, -1.0e6)).is_none());
    }

    #[test]
    fn test_accessors_out_of_range() {
        let map = PolyMap::generate(small_config("access")).unwrap();
        assert!(map.center(map.centers().len()).is_none());
        assert!(map.corner(map.corners().len()).is_none());
        assert!(map.edge(map.edges().len()).is_none());
        assert!(map.center_polygon(usize::MAX).is_empty());
        assert!(map.center_polygon(0).len() >= 2);
        assert_eq!(map.region_index().len(), map.centers().len());
        assert_eq!(map.seed(), "access");
    }

    #[test]
    fn test_from_graph_restores_lookup() {
        let map = PolyMap::generate(small_config("restore")).unwrap();
        let config = map.config().clone();
        let p = Vector2::new(120.0, 90.0);
        let before = map.get_center_at(p).map(|c| c.id);

        let restored = PolyMap::from_graph(config, map.into_graph()).unwrap();
        assert_eq!(restored.get_center_at(p).map(|c| c.id), before);
    }

    #[test]
    fn test_from_graph_rejects_broken_graph() {
        let map = PolyMap::generate(small_config("broken")).unwrap();
        let config = map.config().clone();
        let mut graph = map.into_graph();
        graph.edges[0].d1 = graph.edges[0].d0;
        assert!(PolyMap::from_graph(config, graph).is_err());
    }

    #[test]
    fn test_invalid_config_fails_before_generation() {
        let mut config = small_config("invalid");
        config.min_distance = -3.0;
        assert!(PolyMap::generate(config).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_graph_serialization_roundtrip() {
        let map = PolyMap::generate(small_config("serde")).unwrap();
        let json = serde_json::to_string(map.graph()).unwrap();
        let graph: MapGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(&graph, map.graph());

        let restored = PolyMap::from_graph(map.config().clone(), graph).unwrap();
        assert_eq!(restored.centers().len(), map.centers().len());
    }
}
