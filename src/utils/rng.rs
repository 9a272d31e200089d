//! Seeded random number generation for reproducible weight initialization.
//!
//! Wraps a ChaCha8 generator so that two networks built from the same seed
//! receive identical initial weights.

use ndarray::Array2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

/// Random number generator used when layers need initial parameters.
pub struct SeededRng {
    inner: ChaCha8Rng,
}

impl SeededRng {
    /// Create a new RNG with an explicit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Create an RNG seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            inner: ChaCha8Rng::from_entropy(),
        }
    }

    /// Sample from the standard normal distribution N(0, 1).
    pub fn normal(&mut self) -> f32 {
        StandardNormal.sample(&mut self.inner)
    }

    /// Matrix of independent N(0, 1) samples multiplied by `scale`.
    pub fn normal_matrix(&mut self, rows: usize, cols: usize, scale: f32) -> Array2<f32> {
        Array2::from_shape_simple_fn((rows, cols), || self.normal() * scale)
    }
}
