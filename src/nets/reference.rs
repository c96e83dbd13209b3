//! Small reference networks.
//!
//! These are deliberately tiny (a dozen parameters each) so that the
//! finite-difference gradient engine stays cheap.

use super::{Discriminator, FeatureExtractor, Generator};
use crate::core::{luma, resize_image, Image, ImageBatch, Resample};
use nalgebra::{Matrix3, Vector3};

const UPSCALE: u32 = 4;

/// Bicubic 4x upsampling followed by a learned per-pixel color affine and tanh.
///
/// Weights: 9 matrix entries (row-major) then 3 bias terms.
#[derive(Debug, Clone, Default)]
pub struct AffineUpscaler;

impl AffineUpscaler {
    pub const NUM_WEIGHTS: usize = 12;

    fn unpack(weights: &[f32]) -> (Matrix3<f32>, Vector3<f32>) {
        assert_eq!(weights.len(), Self::NUM_WEIGHTS, "generator weight count");
        (
            Matrix3::from_row_slice(&weights[..9]),
            Vector3::new(weights[9], weights[10], weights[11]),
        )
    }
}

impl Generator for AffineUpscaler {
    /// `tanh(2x - 1)`: maps `[0, 1]` symmetrically around 0.
    fn initial_weights(&self) -> Vec<f32> {
        let mut w = vec![0.0; Self::NUM_WEIGHTS];
        w[0] = 2.0;
        w[4] = 2.0;
        w[8] = 2.0;
        w[9..].fill(-1.0);
        w
    }

    fn upscale(&self, weights: &[f32], lr: &ImageBatch) -> ImageBatch {
        let (m, b) = Self::unpack(weights);
        let (w, h) = lr.dimensions();
        lr.map(|img| {
            resize_image(img, w * UPSCALE, h * UPSCALE, Resample::Bicubic)
                .map(|p| (m * p + b).map(f32::tanh))
        })
    }
}

/// Linear critic over per-image statistics.
///
/// Features: channel means (3), channel standard deviations (3), mean absolute
/// horizontal and vertical luma gradients (2). Weights: one per feature plus a bias.
#[derive(Debug, Clone, Default)]
pub struct StatisticsCritic;

impl StatisticsCritic {
    pub const NUM_FEATURES: usize = 8;
    pub const NUM_WEIGHTS: usize = Self::NUM_FEATURES + 1;

    pub fn statistics(img: &Image) -> [f32; Self::NUM_FEATURES] {
        let mean = img.channel_means();
        let n = img.pixels().len().max(1) as f32;
        let var = img
            .pixels()
            .iter()
            .fold(Vector3::<f32>::zeros(), |acc, p| acc + (p - mean).component_mul(&(p - mean)))
            / n;

        let (w, h) = img.dimensions();
        let (mut gx, mut gy) = (0.0f32, 0.0f32);
        for y in 0..h {
            for x in 0..w {
                let l = luma(img.get(x, y));
                if x + 1 < w {
                    gx += (luma(img.get(x + 1, y)) - l).abs();
                }
                if y + 1 < h {
                    gy += (luma(img.get(x, y + 1)) - l).abs();
                }
            }
        }
        let gx = gx / ((w.saturating_sub(1) * h).max(1) as f32);
        let gy = gy / ((w * h.saturating_sub(1)).max(1) as f32);

        [
            mean.x,
            mean.y,
            mean.z,
            var.x.sqrt(),
            var.y.sqrt(),
            var.z.sqrt(),
            gx,
            gy,
        ]
    }
}

impl Discriminator for StatisticsCritic {
    fn initial_weights(&self) -> Vec<f32> {
        vec![0.0; Self::NUM_WEIGHTS]
    }

    fn logits(&self, weights: &[f32], batch: &ImageBatch) -> Vec<f32> {
        assert_eq!(weights.len(), Self::NUM_WEIGHTS, "discriminator weight count");
        let bias = weights[Self::NUM_FEATURES];
        batch
            .iter()
            .map(|img| {
                Self::statistics(img)
                    .iter()
                    .zip(weights)
                    .map(|(f, w)| f * w)
                    .sum::<f32>()
                    + bias
            })
            .collect()
    }
}

/// Frozen luma pyramid: full, 1/2 and 1/4 resolution luma, area-downsampled.
#[derive(Debug, Clone)]
pub struct LumaPyramid {
    levels: u32,
}

impl LumaPyramid {
    pub fn new(levels: u32) -> Self {
        Self {
            levels: levels.max(1),
        }
    }
}

impl Default for LumaPyramid {
    fn default() -> Self {
        Self::new(3)
    }
}

impl FeatureExtractor for LumaPyramid {
    fn features(&self, batch: &ImageBatch) -> Vec<f32> {
        let mut out = Vec::new();
        for img in batch.iter() {
            let (w, h) = img.dimensions();
            for level in 0..self.levels {
                let f = 1 << level;
                let scaled = resize_image(img, (w / f).max(1), (h / f).max(1), Resample::Area);
                out.extend(scaled.pixels().iter().map(|&p| luma(p)));
            }
        }
        out
    }
}
