//! Loss functions for SRGAN training.
//!
//! All losses are scalar means. Logits are pre-sigmoid; the binary cross
//! entropy is evaluated in the numerically stable form
//! `max(x, 0) - x·z + ln(1 + e^{-|x|})`.

use crate::core::ImageBatch;
use crate::nets::FeatureExtractor;

/// Weight of the adversarial term in the generator loss.
pub const ADVERSARIAL_WEIGHT: f32 = 1e-3;

/// Weight of the perceptual (feature-space) term in the generator loss.
pub const PERCEPTUAL_WEIGHT: f32 = 2e-6;

/// Mean squared error over two equally long slices.
pub fn mse_slice(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "mse: length mismatch");
    if a.is_empty() {
        return 0.0;
    }
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| {
            let d = (x - y) as f64;
            d * d
        })
        .sum();
    (sum / a.len() as f64) as f32
}

/// Mean squared error over every element of two batches.
pub fn mse(a: &ImageBatch, b: &ImageBatch) -> f32 {
    assert_eq!(a.len(), b.len(), "mse: batch size mismatch");
    assert_eq!(a.dimensions(), b.dimensions(), "mse: shape mismatch");
    let sum: f64 = a
        .scalars()
        .zip(b.scalars())
        .map(|(x, y)| {
            let d = (x - y) as f64;
            d * d
        })
        .sum();
    (sum / a.element_count() as f64) as f32
}

/// Sigmoid cross entropy of one logit against target `z` in `[0, 1]`.
#[inline]
pub fn bce_with_logits(logit: f32, target: f32) -> f32 {
    logit.max(0.0) - logit * target + (-logit.abs()).exp().ln_1p()
}

/// Mean sigmoid cross entropy of `logits` against a constant target.
pub fn mean_bce(logits: &[f32], target: f32) -> f32 {
    if logits.is_empty() {
        return 0.0;
    }
    logits.iter().map(|&x| bce_with_logits(x, target)).sum::<f32>() / logits.len() as f32
}

/// `[-1, 1] -> [0, 1]`.
pub fn denorm(batch: &ImageBatch) -> ImageBatch {
    batch.map(|img| img.map(|p| p.add_scalar(1.0) / 2.0))
}

/// Pixel-wise pretraining loss: `mse(G(lr), hr)`.
pub fn init_loss(generated: &ImageBatch, hr: &ImageBatch) -> f32 {
    mse(generated, hr)
}

/// `mean(bce(D(hr), 1)) + mean(bce(D(G(lr)), 0))`.
pub fn discriminator_loss(real_logits: &[f32], fake_logits: &[f32]) -> f32 {
    mean_bce(real_logits, 1.0) + mean_bce(fake_logits, 0.0)
}

/// Weighted terms of the generator objective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorLossBreakdown {
    /// `ADVERSARIAL_WEIGHT · mean(bce(D(G(lr)), 1))`
    pub adversarial: f32,
    /// `mse(G(lr), hr)`
    pub content: f32,
    /// `PERCEPTUAL_WEIGHT · mse(F(denorm(G(lr))), F(denorm(hr)))`
    pub perceptual: f32,
}

impl GeneratorLossBreakdown {
    pub fn total(&self) -> f32 {
        self.adversarial + self.content + self.perceptual
    }
}

/// Adversarial + content + perceptual generator loss.
pub fn generator_loss(
    fake_logits: &[f32],
    generated: &ImageBatch,
    hr: &ImageBatch,
    features: &dyn FeatureExtractor,
) -> GeneratorLossBreakdown {
    let fake_features = features.features(&denorm(generated));
    let real_features = features.features(&denorm(hr));
    GeneratorLossBreakdown {
        adversarial: ADVERSARIAL_WEIGHT * mean_bce(fake_logits, 1.0),
        content: mse(generated, hr),
        perceptual: PERCEPTUAL_WEIGHT * mse_slice(&fake_features, &real_features),
    }
}
