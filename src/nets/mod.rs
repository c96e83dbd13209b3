//! Network contracts used by the training orchestrator.
//!
//! The orchestrator treats every network as a pure function of a flat weight
//! vector. That keeps optimizer state, checkpoints and gradient computation
//! independent of any particular architecture.
//!
//! `reference` provides small concrete implementations so the training loop
//! can run end to end.

mod reference;

use crate::core::ImageBatch;

pub use reference::{AffineUpscaler, LumaPyramid, StatisticsCritic};

/// Generator: low-resolution batch in `[0, 1]` to a 4x batch in roughly `[-1, 1]`.
pub trait Generator: Send + Sync {
    /// Starting weights for a fresh run.
    fn initial_weights(&self) -> Vec<f32>;

    /// Upscale every image by exactly 4x.
    fn upscale(&self, weights: &[f32], lr: &ImageBatch) -> ImageBatch;
}

/// Discriminator: one pre-sigmoid logit per image ("real" is positive).
pub trait Discriminator: Send + Sync {
    fn initial_weights(&self) -> Vec<f32>;

    fn logits(&self, weights: &[f32], batch: &ImageBatch) -> Vec<f32>;
}

/// Frozen perceptual feature extractor. Input is expected in `[0, 1]`.
pub trait FeatureExtractor: Send + Sync {
    fn features(&self, batch: &ImageBatch) -> Vec<f32>;
}
