//! Ordered, probability-gated augmentation pipeline.
//!
//! A pipeline is a list of [`Step`]s. Each step pairs a probability with an
//! [`Op`]; a step with probability below 1 draws one uniform value from the
//! random source and runs only when that draw is below the probability.
//! Steps with probability 1 never draw for gating, so the exact sequence of
//! draws a sample consumes can be read off the step list.
//!
//! Ops before [`Op::Split`] act on a single image. `Split` duplicates it into
//! the `(lr, hr)` pair, after which the `*Lr` ops only touch the
//! low-resolution branch.

use super::jitter::{adjust_contrast, adjust_hue};
use crate::core::{downscale_by, Image, Resample};
use crate::degrade::{
    blur_gaussian, ring_artifact, rgb_to_yuv_degrade, yuv_to_rgb_degrade, DegradeError,
};
use crate::random::RandomSource;
use image::RgbImage;
use tracing::trace;

/// Super-resolution factor between hr and lr.
pub const SCALE: u32 = 4;

/// A low/high resolution training pair in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePair {
    pub lr: Image,
    pub hr: Image,
}

/// One augmentation operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Hue rotation by a delta drawn from `[-max_delta, max_delta)`.
    Hue { max_delta: f32 },
    /// Contrast factor drawn from `[lower, upper)`, followed by a clip.
    Contrast { lower: f32, upper: f32 },
    /// Mirror left/right on a fair coin.
    FlipHorizontal,
    /// Rotate by a uniformly drawn multiple of 90° counter-clockwise.
    Rotate90,
    /// Gaussian blur of the single image (both branches after a split).
    Blur { sigma: f32, shape: (usize, usize) },
    /// `lr = hr = image`.
    Split,
    /// Ringing on lr with σ drawn from `sigma`.
    RingLr {
        sigma: (f32, f32),
        shape: (usize, usize),
    },
    /// Gaussian blur on lr with σ drawn from `sigma`.
    BlurLr {
        sigma: (f32, f32),
        shape: (usize, usize),
    },
    /// Downscale lr by `factor`, area or bicubic on a fair coin.
    DownsampleLr { factor: u32 },
    /// YUV compression of both branches. lr gets a quality drawn from
    /// `lr_quality` with chroma subsampling; hr gets `hr_quality` without.
    Compress {
        lr_quality: (u8, u8),
        hr_quality: u8,
    },
}

/// A gated op.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub probability: f32,
    pub op: Op,
}

impl Step {
    pub fn always(op: Op) -> Self {
        Self {
            probability: 1.0,
            op,
        }
    }

    pub fn sometimes(probability: f32, op: Op) -> Self {
        Self { probability, op }
    }
}

enum Working {
    Single(Image),
    Split { lr: Image, hr: Image },
}

impl Working {
    fn map_all(self, f: impl Fn(&Image) -> Image) -> Self {
        match self {
            Working::Single(img) => Working::Single(f(&img)),
            Working::Split { lr, hr } => Working::Split {
                lr: f(&lr),
                hr: f(&hr),
            },
        }
    }

    fn split(self) -> (Image, Image) {
        match self {
            Working::Single(img) => (img.clone(), img),
            Working::Split { lr, hr } => (lr, hr),
        }
    }
}

/// Ordered list of augmentation steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// The training augmentation used to build SRGAN pairs.
    pub fn training() -> Self {
        Self::new(vec![
            Step::always(Op::Hue { max_delta: 0.5 }),
            Step::always(Op::Contrast {
                lower: 0.5,
                upper: 2.0,
            }),
            Step::always(Op::FlipHorizontal),
            Step::always(Op::Rotate90),
            Step::sometimes(
                0.1,
                Op::Blur {
                    sigma: 1.0,
                    shape: (5, 5),
                },
            ),
            Step::always(Op::Split),
            Step::sometimes(
                0.1,
                Op::RingLr {
                    sigma: (2.0, 5.0),
                    shape: (5, 5),
                },
            ),
            Step::sometimes(
                0.1,
                Op::BlurLr {
                    sigma: (0.1, 0.5),
                    shape: (3, 3),
                },
            ),
            Step::always(Op::DownsampleLr { factor: SCALE }),
            Step::sometimes(
                0.8,
                Op::Compress {
                    lr_quality: (70, 90),
                    hr_quality: 95,
                },
            ),
        ])
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Run every step on an 8-bit source image.
    pub fn run(&self, src: &RgbImage, rng: &mut dyn RandomSource) -> Result<SamplePair, DegradeError> {
        let mut state = Working::Single(Image::from_rgb8(src));
        for (i, step) in self.steps.iter().enumerate() {
            if step.probability < 1.0 && rng.uniform() >= step.probability {
                continue;
            }
            trace!(step = i, op = ?step.op, "augment");
            state = apply(&step.op, state, rng)?;
        }
        let (lr, hr) = state.split();
        Ok(SamplePair { lr, hr })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::training()
    }
}

fn apply(op: &Op, state: Working, rng: &mut dyn RandomSource) -> Result<Working, DegradeError> {
    let out = match *op {
        Op::Hue { max_delta } => {
            let delta = rng.range(-max_delta, max_delta);
            state.map_all(|img| adjust_hue(img, delta))
        }
        Op::Contrast { lower, upper } => {
            let factor = rng.range(lower, upper);
            state.map_all(|img| adjust_contrast(img, factor).clip(0.0, 1.0))
        }
        Op::FlipHorizontal => {
            if rng.uniform() < 0.5 {
                state.map_all(Image::flip_horizontal)
            } else {
                state
            }
        }
        Op::Rotate90 => {
            let k = rng.below(4);
            state.map_all(|img| img.rotate90(k))
        }
        Op::Blur { sigma, shape } => state.map_all(|img| blur_gaussian(img, sigma, shape, true)),
        Op::Split => {
            let (lr, hr) = state.split();
            Working::Split { lr, hr }
        }
        Op::RingLr { sigma, shape } => {
            let s = rng.range(sigma.0, sigma.1);
            let (lr, hr) = state.split();
            Working::Split {
                lr: ring_artifact(&lr, s, shape, true),
                hr,
            }
        }
        Op::BlurLr { sigma, shape } => {
            let s = rng.range(sigma.0, sigma.1);
            let (lr, hr) = state.split();
            Working::Split {
                lr: blur_gaussian(&lr, s, shape, true),
                hr,
            }
        }
        Op::DownsampleLr { factor } => {
            let method = if rng.uniform() < 0.5 {
                Resample::Area
            } else {
                Resample::Bicubic
            };
            let (lr, hr) = state.split();
            Working::Split {
                lr: downscale_by(&lr, factor, method),
                hr,
            }
        }
        Op::Compress {
            lr_quality,
            hr_quality,
        } => {
            let span = u32::from(lr_quality.1.saturating_sub(lr_quality.0)).max(1);
            let q = lr_quality.0 + rng.below(span) as u8;
            let (lr, hr) = state.split();
            let lr_planes = rgb_to_yuv_degrade(&lr, Some(q), true, Resample::Area, true)?;
            let hr_planes = rgb_to_yuv_degrade(&hr, Some(hr_quality), false, Resample::Area, true)?;
            Working::Split {
                lr: yuv_to_rgb_degrade(&lr_planes, Resample::Bicubic, true),
                hr: yuv_to_rgb_degrade(&hr_planes, Resample::Bicubic, true),
            }
        }
    };
    Ok(out)
}

/// Training augmentation with the default pipeline.
pub fn augment_images(src: &RgbImage, rng: &mut dyn RandomSource) -> Result<SamplePair, DegradeError> {
    Pipeline::training().run(src, rng)
}

/// Deterministic validation pair: scale to `[0, 1]`, bicubic lr at `1 / SCALE`.
pub fn augment_valid(src: &RgbImage) -> SamplePair {
    let hr = Image::from_rgb8(src);
    let lr = downscale_by(&hr, SCALE, Resample::Bicubic);
    SamplePair { lr, hr }
}
