//! Seedable randomness (§5, §9). Two call sites consume it: blunder-branch
//! selection and CDF-inversion sampling in the fusion core (§4.8). The
//! teacher (`engine.rs::random_f64`) reaches for `rand::thread_rng()`
//! unconditionally; this crate keeps that for production use but makes the
//! stream swappable with a fixed seed so test fixtures are deterministic
//! (§8 property 6).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct PredictorRng {
    inner: StdRng,
}

impl PredictorRng {
    pub fn from_entropy() -> Self {
        PredictorRng { inner: StdRng::from_entropy() }
    }

    pub fn from_seed(seed: u64) -> Self {
        PredictorRng { inner: StdRng::seed_from_u64(seed) }
    }

    /// Uniform sample in [0, 1).
    pub fn uniform(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform integer index in `0..len`. Panics if `len == 0`.
    pub fn uniform_index(&mut self, len: usize) -> usize {
        self.inner.gen_range(0..len)
    }
}

impl Default for PredictorRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}
