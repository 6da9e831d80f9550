//! 3D Perlin noise
//!
//! Default coherent-noise oracle for the island shape. Standard Ken Perlin
//! permutation table and gradients, hashed together with a seed, and summed
//! over octaves as fractal Brownian motion.

use glam::DVec3;

use super::NoiseField;

/// Configuration for fractal Perlin noise
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerlinConfig {
    /// Base frequency controls feature size (lower = larger features)
    pub base_frequency: f64,
    /// Number of octaves for fractal detail layers
    pub octaves: usize,
    /// Amplitude decay per octave (controls roughness)
    pub persistence: f64,
    /// Frequency multiplier per octave
    pub lacunarity: f64,
}

impl Default for PerlinConfig {
    fn default() -> Self {
        Self {
            base_frequency: 1.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

// Ken Perlin's reference permutation; changing it changes every generated map.
const PERM: [u32; 256] = [
    151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225, 140, 36, 103, 30, 69,
    142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148, 247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219,
    203, 117, 35, 11, 32, 57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68, 175,
    74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111, 229, 122, 60, 211, 133, 230,
    220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54, 65, 25, 63, 161, 1, 216, 80, 73, 209, 76,
    132, 187, 208, 89, 18, 169, 200, 196, 135, 130, 116, 188, 159, 86, 164, 100, 109, 198, 173,
    186, 3, 64, 52, 217, 226, 250, 124, 123, 5, 202, 38, 147, 118, 126, 255, 82, 85, 212, 207, 206,
    59, 227, 47, 16, 58, 17, 182, 189, 28, 42, 223, 183, 170, 213, 119, 248, 152, 2, 44, 154, 163,
    70, 221, 153, 101, 155, 167, 43, 172, 9, 129, 22, 39, 253, 19, 98, 108, 110, 79, 113, 224, 232,
    178, 185, 112, 104, 218, 246, 97, 228, 251, 34, 242, 193, 238, 210, 144, 12, 191, 179, 162,
    241, 81, 51, 145, 235, 249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157, 184, 84, 204,
    176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93, 222, 114, 67, 29, 24, 72, 243, 141,
    128, 195, 78, 66, 215, 61, 156, 180,
];

/// Seeded three-level permutation lookup
#[inline]
fn hash(x: i64, y: i64, z: i64, seed: u32) -> u32 {
    let seed_hash = (seed.wrapping_mul(1103515245).wrapping_add(12345)) >> 16;
    let ix = ((x as u32) ^ seed_hash) & 255;
    let iy = ((y as u32) ^ (seed_hash >> 8)) & 255;
    let iz = ((z as u32) ^ (seed_hash >> 16)) & 255;
    let a = PERM[ix as usize];
    let b = PERM[((a + iy) & 255) as usize];
    PERM[((b + iz) & 255) as usize]
}

/// Dot product with one of the 12 cube edge gradients
#[inline]
fn gradient(hash_value: u32, x: f64, y: f64, z: f64) -> f64 {
    let h = hash_value & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };

    let sign_u = if (h & 1) == 0 { -u } else { u };
    let sign_v = if (h & 2) == 0 { -v } else { v };
    sign_u + sign_v
}

/// Quintic fade `6t⁵ - 15t⁴ + 10t³`
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Single octave of Perlin noise, roughly in [-1, 1]
fn perlin_3d(pos: DVec3, seed: u32) -> f64 {
    let cell = pos.floor();
    let (x0, y0, z0) = (cell.x as i64, cell.y as i64, cell.z as i64);
    let (x1, y1, z1) = (x0 + 1, y0 + 1, z0 + 1);
    let f = pos - cell;

    let u = fade(f.x);
    let v = fade(f.y);
    let w = fade(f.z);

    let g_aaa = gradient(hash(x0, y0, z0, seed), f.x, f.y, f.z);
    let g_baa = gradient(hash(x1, y0, z0, seed), f.x - 1.0, f.y, f.z);
    let g_aba = gradient(hash(x0, y1, z0, seed), f.x, f.y - 1.0, f.z);
    let g_bba = gradient(hash(x1, y1, z0, seed), f.x - 1.0, f.y - 1.0, f.z);
    let g_aab = gradient(hash(x0, y0, z1, seed), f.x, f.y, f.z - 1.0);
    let g_bab = gradient(hash(x1, y0, z1, seed), f.x - 1.0, f.y, f.z - 1.0);
    let g_abb = gradient(hash(x0, y1, z1, seed), f.x, f.y - 1.0, f.z - 1.0);
    let g_bbb = gradient(hash(x1, y1, z1, seed), f.x - 1.0, f.y - 1.0, f.z - 1.0);

    let x00 = lerp(g_aaa, g_baa, u);
    let x10 = lerp(g_aba, g_bba, u);
    let x01 = lerp(g_aab, g_bab, u);
    let x11 = lerp(g_abb, g_bbb, u);
    lerp(lerp(x00, x10, v), lerp(x01, x11, v), w)
}

/// Fractal Brownian motion over `config.octaves`, normalized to [-1, 1]
pub fn sample_perlin_fbm(position: DVec3, seed: u32, config: &PerlinConfig) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = config.base_frequency;
    let mut max_value = 0.0;

    for _ in 0..config.octaves {
        total += perlin_3d(position * frequency, seed) * amplitude;
        max_value += amplitude;
        amplitude *= config.persistence;
        frequency *= config.lacunarity;
    }

    if max_value > 0.0 {
        (total / max_value).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Seeded fractal Perlin noise as a [`NoiseField`]
///
/// # Example
///
/// ```
/// use poly_map::terrain::{NoiseField, PerlinNoise};
///
/// let noise = PerlinNoise::new(42);
/// let value = noise.sample(0.3, 1.7, 12.0);
/// assert!((-1.0..=1.0).contains(&value));
/// assert_eq!(value, noise.sample(0.3, 1.7, 12.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerlinNoise {
    pub seed: u32,
    pub config: PerlinConfig,
}

impl PerlinNoise {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            config: PerlinConfig::default(),
        }
    }

    pub fn with_config(seed: u32, config: PerlinConfig) -> Self {
        Self { seed, config }
    }
}

impl NoiseField for PerlinNoise {
    fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        sample_perlin_fbm(DVec3::new(x, y, z), self.seed, &self.config)
    }
}
