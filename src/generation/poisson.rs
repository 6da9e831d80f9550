//! Poisson disk sampling
//!
//! Produces a blue-noise point set: every pair of points is at least
//! `min_distance` apart, and the rectangle is filled until no more points fit.
//! The number of points is an output of the algorithm, not an input.
//!
//! # Algorithm
//!
//! A background grid with cell size `min_distance / √2` holds at most one
//! sample per cell. Starting from one random point, a random active point is
//! removed from the active list and up to `attempts` candidates are thrown in
//! the annulus `[d, 2d)` around it. Candidates inside the rectangle and far
//! enough from every sample in the surrounding cells are accepted and become
//! active themselves. Sampling stops when the active list is empty.

use rand::Rng;
use std::f64::consts::TAU;

use crate::geometry::Vector2;

/// Blue-noise point generator over a `width × height` rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoissonDiskSampler {
    width: f64,
    height: f64,
    min_distance: f64,
    attempts: usize,
    cell_size: f64,
    grid_width: usize,
    grid_height: usize,
}

impl PoissonDiskSampler {
    /// Create a sampler
    ///
    /// # Arguments
    ///
    /// * `width`, `height` - Rectangle size, points lie in `[0, width) × [0, height)`
    /// * `min_distance` - Minimum separation between any two points
    /// * `attempts` - Candidates tried around each active point before it retires
    pub fn new(width: f64, height: f64, min_distance: f64, attempts: usize) -> Self {
        let cell_size = min_distance / std::f64::consts::SQRT_2;
        Self {
            width,
            height,
            min_distance,
            attempts,
            cell_size,
            grid_width: (width / cell_size).ceil().max(1.0) as usize,
            grid_height: (height / cell_size).ceil().max(1.0) as usize,
        }
    }

    /// Generate the point set
    ///
    /// Points are returned in acceptance order, which is not spatially meaningful.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Vector2> {
        let mut grid: Vec<Option<usize>> = vec![None; self.grid_width * self.grid_height];
        let mut samples: Vec<Vector2> = Vec::new();
        let mut active: Vec<usize> = Vec::new();

        let first = Vector2::new(
            rng.gen_range(0.0..self.width),
            rng.gen_range(0.0..self.height),
        );
        self.accept(first, &mut grid, &mut samples, &mut active);

        while !active.is_empty() {
            let pick = rng.gen_range(0..active.len());
            let origin = samples[active.swap_remove(pick)];

            for _ in 0..self.attempts {
                let candidate = self.point_around(origin, rng);
                if self.in_rectangle(candidate)
                    && !self.has_close_neighbour(candidate, &grid, &samples)
                {
                    self.accept(candidate, &mut grid, &mut samples, &mut active);
                }
            }
        }

        samples
    }

    fn accept(
        &self,
        point: Vector2,
        grid: &mut [Option<usize>],
        samples: &mut Vec<Vector2>,
        active: &mut Vec<usize>,
    ) {
        let (gx, gy) = self.cell_of(point);
        let index = samples.len();
        grid[gy * self.grid_width + gx] = Some(index);
        samples.push(point);
        active.push(index);
    }

    fn point_around<R: Rng + ?Sized>(&self, origin: Vector2, rng: &mut R) -> Vector2 {
        let radius = self.min_distance * (1.0 + rng.gen::<f64>());
        let angle = TAU * rng.gen::<f64>();
        origin + Vector2::new(angle.cos(), angle.sin()) * radius
    }

    #[inline]
    fn in_rectangle(&self, p: Vector2) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x < self.width && p.y < self.height
    }

    #[inline]
    fn cell_of(&self, p: Vector2) -> (usize, usize) {
        let gx = ((p.x / self.cell_size) as usize).min(self.grid_width - 1);
        let gy = ((p.y / self.cell_size) as usize).min(self.grid_height - 1);
        (gx, gy)
    }

    /// A sample closer than `min_distance` can sit up to two cells away
    fn has_close_neighbour(&self, p: Vector2, grid: &[Option<usize>], samples: &[Vector2]) -> bool {
        let (gx, gy) = self.cell_of(p);
        let min_sq = self.min_distance * self.min_distance;

        let x_range = gx.saturating_sub(2)..=(gx + 2).min(self.grid_width - 1);
        for y in gy.saturating_sub(2)..=(gy + 2).min(self.grid_height - 1) {
            for x in x_range.clone() {
                if let Some(index) = grid[y * self.grid_width + x] {
                    if samples[index].distance_squared(p) < min_sq {
                        return true;
                    }
                }
            }
        }
        false
    }
}
