//! Random sources threaded explicitly through the augmentation pipeline.
//!
//! Nothing in this crate touches a process-wide generator. Every stochastic
//! operator takes `&mut dyn RandomSource`, so a run is reproducible from its
//! seed and tests can replace the source with a scripted sequence that forces
//! a particular branch.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::collections::VecDeque;

/// Source of uniform and Gaussian draws.
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`.
    fn uniform(&mut self) -> f32;

    /// Standard normal draw (mean 0, std 1).
    fn gaussian(&mut self) -> f32;

    /// Uniform draw in `[lo, hi)`.
    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.uniform()
    }

    /// Uniform integer in `0..n`.
    fn below(&mut self, n: u32) -> u32 {
        ((self.uniform() * n as f32) as u32).min(n.saturating_sub(1))
    }
}

/// `StdRng`-backed source.
pub struct SeededSource {
    rng: StdRng,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Independent stream for one sample of one epoch.
    ///
    /// Samples are prepared in parallel, so each gets its own generator keyed by
    /// `(seed, epoch, index)` instead of sharing one sequential stream.
    pub fn for_sample(seed: u64, epoch: u64, index: u64) -> Self {
        // splitmix64-style mixing so neighbouring indices do not share prefixes.
        let mut z = seed
            ^ epoch.wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ index.wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        Self::new(z ^ (z >> 31))
    }
}

impl RandomSource for SeededSource {
    fn uniform(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    fn gaussian(&mut self) -> f32 {
        self.rng.sample(StandardNormal)
    }
}

/// Replays a fixed list of uniform draws (and a constant Gaussian value).
///
/// Panics when the script runs out, which makes a test fail loudly if the
/// pipeline consumes more draws than expected.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    uniforms: VecDeque<f32>,
    gaussian: f32,
    consumed: usize,
}

impl ScriptedSource {
    pub fn new(uniforms: impl IntoIterator<Item = f32>) -> Self {
        Self {
            uniforms: uniforms.into_iter().collect(),
            gaussian: 0.0,
            consumed: 0,
        }
    }

    /// Value returned by every `gaussian()` call.
    pub fn with_gaussian(mut self, value: f32) -> Self {
        self.gaussian = value;
        self
    }

    /// Number of uniform draws taken so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn remaining(&self) -> usize {
        self.uniforms.len()
    }
}

impl RandomSource for ScriptedSource {
    fn uniform(&mut self) -> f32 {
        self.consumed += 1;
        self.uniforms
            .pop_front()
            .unwrap_or_else(|| panic!("scripted random source exhausted after {} draws", self.consumed - 1))
    }

    fn gaussian(&mut self) -> f32 {
        self.gaussian
    }
}
