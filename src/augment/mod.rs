//! Training and validation pair synthesis.

pub mod jitter;
pub mod pipeline;

pub use jitter::{adjust_contrast, adjust_hue};
pub use pipeline::{augment_images, augment_valid, Op, Pipeline, SamplePair, Step, SCALE};
