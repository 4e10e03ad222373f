//! The seeded random source of a match.
//!
//! Every random draw in the engine goes through one [`SimRng`], owned by the
//! simulation and passed by `&mut` into the resolver. Two matches with the
//! same seed, scenario, and action batches therefore evolve identically.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded pseudo-random generator for spawn placement, gathering,
/// recharging, and random action failure.
#[derive(Debug, Clone)]
pub struct SimRng {
    inner: StdRng,
}

impl SimRng {
    /// Create a generator from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    /// `true` with probability `p`. Values outside `[0, 1]` are clamped.
    pub fn chance(&mut self, p: f64) -> bool {
        let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        self.inner.random_bool(p)
    }

    /// A value in `[low, high]`. The bounds may be given in either order.
    pub fn range_inclusive(&mut self, low: u32, high: u32) -> u32 {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        self.inner.random_range(low..=high)
    }

    /// `true` with probability `pct` percent.
    pub fn percent(&mut self, pct: u8) -> bool {
        if pct == 0 {
            return false;
        }
        self.inner.random_range(0..100_u8) < pct
    }

    /// A value in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.inner.random::<f64>()
    }
}
