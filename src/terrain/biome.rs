//! Biome classification (pass 11)

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::graph::MapGraph;

/// Biome of a map polygon
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Biome {
    Ocean,
    Lake,
    Beach,
    Snow,
    Tundra,
    Mountain,
    Taiga,
    Shrubland,
    TemperateDesert,
    TemperateRainForest,
    TemperateDeciduousForest,
    Grassland,
    TropicalRainForest,
    TropicalSeasonalForest,
    SubtropicalDesert,
}

impl Biome {
    /// Every biome, in declaration order
    pub const ALL: [Biome; 15] = [
        Biome::Ocean,
        Biome::Lake,
        Biome::Beach,
        Biome::Snow,
        Biome::Tundra,
        Biome::Mountain,
        Biome::Taiga,
        Biome::Shrubland,
        Biome::TemperateDesert,
        Biome::TemperateRainForest,
        Biome::TemperateDeciduousForest,
        Biome::Grassland,
        Biome::TropicalRainForest,
        Biome::TropicalSeasonalForest,
        Biome::SubtropicalDesert,
    ];

    #[inline]
    pub fn is_water(self) -> bool {
        matches!(self, Biome::Ocean | Biome::Lake)
    }

    pub fn name(self) -> &'static str {
        match self {
            Biome::Ocean => "Ocean",
            Biome::Lake => "Lake",
            Biome::Beach => "Beach",
            Biome::Snow => "Snow",
            Biome::Tundra => "Tundra",
            Biome::Mountain => "Mountain",
            Biome::Taiga => "Taiga",
            Biome::Shrubland => "Shrubland",
            Biome::TemperateDesert => "Temperate Desert",
            Biome::TemperateRainForest => "Temperate Rain Forest",
            Biome::TemperateDeciduousForest => "Temperate Deciduous Forest",
            Biome::Grassland => "Grassland",
            Biome::TropicalRainForest => "Tropical Rain Forest",
            Biome::TropicalSeasonalForest => "Tropical Seasonal Forest",
            Biome::SubtropicalDesert => "Subtropical Desert",
        }
    }
}

/// Moisture rows × elevation columns lookup
///
/// Row `i` covers moisture `[i/6, (i+1)/6)`, the last row also takes 1.0.
/// Columns split elevation at `elevation_thresholds`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BiomeTable {
    pub table: [[Biome; 4]; 6],
    pub elevation_thresholds: [f64; 3],
}

impl Default for BiomeTable {
    fn default() -> Self {
        use Biome::*;
        Self {
            table: [
                [SubtropicalDesert, TemperateDesert, TemperateDesert, Mountain],
                [Grassland, Grassland, TemperateDesert, Mountain],
                [TropicalSeasonalForest, Grassland, Shrubland, Tundra],
                [TropicalSeasonalForest, TemperateDeciduousForest, Shrubland, Snow],
                [TropicalRainForest, TemperateDeciduousForest, Taiga, Snow],
                [TropicalRainForest, TemperateRainForest, Taiga, Snow],
            ],
            elevation_thresholds: [0.3, 0.6, 0.85],
        }
    }
}

impl BiomeTable {
    /// Land biome for a moisture/elevation pair
    pub fn lookup(&self, moisture: f64, elevation: f64) -> Biome {
        let row = ((moisture * 6.0).floor().max(0.0) as usize).min(5);
        let column = self
            .elevation_thresholds
            .iter()
            .take_while(|&&threshold| elevation >= threshold)
            .count();
        self.table[row][column]
    }
}

/// Biome for one polygon's attributes
///
/// # Example
///
/// ```
/// use poly_map::terrain::{classify_biome, Biome, BiomeTable};
///
/// let table = BiomeTable::default();
/// assert_eq!(classify_biome(true, true, false, 0.0, 1.0, &table), Biome::Ocean);
/// assert_eq!(classify_biome(false, false, true, 0.2, 0.3, &table), Biome::Beach);
/// assert_eq!(classify_biome(false, false, false, 0.9, 0.95, &table), Biome::Snow);
/// ```
pub fn classify_biome(
    ocean: bool,
    water: bool,
    coast: bool,
    elevation: f64,
    moisture: f64,
    table: &BiomeTable,
) -> Biome {
    if ocean {
        Biome::Ocean
    } else if water {
        Biome::Lake
    } else if coast && moisture < 0.6 {
        Biome::Beach
    } else {
        table.lookup(moisture, elevation)
    }
}

/// Pass 11: assign a biome to every Center
pub fn assign_biomes(graph: &mut MapGraph, table: &BiomeTable) {
    for center in &mut graph.centers {
        center.biome = Some(classify_biome(
            center.ocean,
            center.water,
            center.coast,
            center.elevation,
            center.moisture,
            table,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vector2;

    #[test]
    fn test_water_overrides() {
        let table = BiomeTable::default();
        assert_eq!(classify_biome(true, true, true, 0.9, 0.1, &table), Biome::Ocean);
        assert_eq!(classify_biome(false, true, true, 0.9, 0.1, &table), Biome::Lake);
        assert_eq!(classify_biome(false, false, true, 0.9, 0.59, &table), Biome::Beach);
        assert_ne!(classify_biome(false, false, true, 0.9, 0.6, &table), Biome::Beach);
    }

    #[test]
    fn test_table_buckets() {
        let table = BiomeTable::default();
        assert_eq!(table.lookup(0.0, 0.0), Biome::SubtropicalDesert);
        assert_eq!(table.lookup(0.0, 0.3), Biome::TemperateDesert);
        assert_eq!(table.lookup(0.2, 0.7), Biome::TemperateDesert);
        assert_eq!(table.lookup(0.4, 0.9), Biome::Tundra);
        assert_eq!(table.lookup(0.55, 0.5), Biome::TemperateDeciduousForest);
        assert_eq!(table.lookup(0.7, 0.7), Biome::Taiga);
        assert_eq!(table.lookup(0.9, 0.4), Biome::TemperateRainForest);
        // moisture 1.0 falls into the last row
        assert_eq!(table.lookup(1.0, 0.1), Biome::TropicalRainForest);
        assert_eq!(table.lookup(1.0, 1.0), Biome::Snow);
    }

    #[test]
    fn test_classification_is_pure() {
        let table = BiomeTable::default();
        for i in 0..50 {
            let e = (i as f64 * 0.37) % 1.0;
            let m = (i as f64 * 0.61) % 1.0;
            let coast = i % 3 == 0;
            assert_eq!(
                classify_biome(false, false, coast, e, m, &table),
                classify_biome(false, false, coast, e, m, &table)
            );
        }
    }

    #[test]
    fn test_identical_centers_get_identical_biomes() {
        let mut graph = MapGraph::new();
        for x in [0.0, 50.0] {
            let c = graph.add_center(Vector2::new(x, 0.0));
            graph.centers[c].coast = true;
            graph.centers[c].elevation = 0.42;
            graph.centers[c].moisture = 0.77;
        }
        assign_biomes(&mut graph, &BiomeTable::default());
        assert_eq!(graph.centers[0].biome, graph.centers[1].biome);
        assert_eq!(graph.centers[0].biome, Some(Biome::TemperateDeciduousForest));
    }

    #[test]
    fn test_custom_table() {
        let table = BiomeTable {
            table: [[Biome::Grassland; 4]; 6],
            elevation_thresholds: [0.5, 0.7, 0.9],
        };
        assert_eq!(table.lookup(0.99, 0.95), Biome::Grassland);
        assert_eq!(classify_biome(false, false, false, 0.1, 0.1, &table), Biome::Grassland);
    }

    #[test]
    fn test_names() {
        assert_eq!(Biome::ALL.len(), 15);
        assert_eq!(Biome::TemperateRainForest.name(), "Temperate Rain Forest");
        assert!(Biome::Lake.is_water());
        assert!(!Biome::Beach.is_water());
    }
}
