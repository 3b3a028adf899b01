//! Injectable random source.
//!
//! Every stochastic draw in a flight goes through [`NoiseSource`] so that a
//! run is fully determined by its seed, and tests can substitute a fixed
//! sequence.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

pub trait NoiseSource {
    /// Draw from N(0, 1).
    fn gaussian(&mut self) -> f64;

    /// Draw from U[0, 1).
    fn uniform(&mut self) -> f64;
}

impl<R: Rng> NoiseSource for R {
    fn gaussian(&mut self) -> f64 {
        StandardNormal.sample(self)
    }

    fn uniform(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Source that always returns the distribution centre. Turns every sampled
/// error into its nominal value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroNoise;

impl NoiseSource for ZeroNoise {
    fn gaussian(&mut self) -> f64 {
        0.0
    }

    fn uniform(&mut self) -> f64 {
        0.5
    }
}

/// Replays a fixed list of standard-normal draws, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct SequenceNoise {
    values: Vec<f64>,
    index: usize,
}

impl SequenceNoise {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, index: 0 }
    }

    fn next(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.index % self.values.len()];
        self.index += 1;
        v
    }
}

impl NoiseSource for SequenceNoise {
    fn gaussian(&mut self) -> f64 {
        self.next()
    }

    fn uniform(&mut self) -> f64 {
        self.next().abs().fract()
    }
}

/// Seeded generator for one Monte Carlo run.
///
/// Each run gets its own substream derived from the ensemble seed and the run
/// index, so runs can be evaluated in any order (or in parallel) and still
/// reproduce bit for bit.
pub fn run_rng(seed: u64, run_index: usize) -> StdRng {
    // splitmix64 finaliser keeps neighbouring run indices decorrelated
    let mut z = seed ^ (run_index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    StdRng::seed_from_u64(z ^ (z >> 31))
}
