//! Example: Generate a polygon map
//!
//! Demonstrates the basic usage of the generation pipeline. Run with
//! `RUST_LOG=debug` to see per-pass timings.

use std::collections::BTreeMap;

use poly_map::*;

fn main() {
    tracing_subscriber::fmt::init();

    println!("Polygon Map Generation Example");
    println!("==============================\n");

    let config = MapConfigBuilder::new()
        .size(800, 600)
        .unwrap()
        .min_distance(10.0)
        .unwrap()
        .seed("TEST")
        .build()
        .unwrap();

    println!("Configuration:");
    println!("  Seed: {} (hash {:#010x})", config.seed, config.seed_hash());
    println!("  Size: {}x{}", config.width, config.height);
    println!("  Min distance: {}", config.min_distance);
    println!("  Expected points: {:.0}", config.expected_point_count());
    println!("  Region depth: {}", config.region_depth());
    println!();

    println!("Generating map...");
    let map = PolyMap::generate(config).expect("Failed to generate map");
    println!(
        "Generated {} centers, {} corners, {} edges from {} points\n",
        map.centers().len(),
        map.corners().len(),
        map.edges().len(),
        map.point_count()
    );

    let land = map.centers().iter().filter(|c| c.is_land()).count();
    let lakes = map.centers().iter().filter(|c| c.water && !c.ocean).count();
    let rivers = map.edges().iter().filter(|e| e.river > 0).count();
    println!("Statistics:");
    println!("  Land polygons: {}", land);
    println!("  Lake polygons: {}", lakes);
    println!("  River edges: {}", rivers);
    println!();

    let mut histogram: BTreeMap<Biome, usize> = BTreeMap::new();
    for center in map.centers() {
        if let Some(biome) = center.biome {
            *histogram.entry(biome).or_insert(0) += 1;
        }
    }
    println!("Biomes:");
    for (biome, count) in &histogram {
        println!("  {:<28} {}", biome.name(), count);
    }

    let point = Vector2::new(400.0, 300.0);
    if let Some(center) = map.get_center_at(point) {
        println!(
            "\nPolygon at ({}, {}): #{} {:?}, elevation {:.2}, moisture {:.2}",
            point.x, point.y, center.id, center.biome, center.elevation, center.moisture
        );
    }

    println!("\nGeneration complete!");
}
