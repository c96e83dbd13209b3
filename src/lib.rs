//! # srgan-rs: SRGAN training in Rust
//!
//! This crate trains a 4x single-image super-resolution GAN. Paired samples
//! are synthesized on the fly from high-resolution source images by a
//! stochastic degradation pipeline, and training runs in two phases: a
//! generator-only MSE pretraining phase followed by adversarial training
//! with a perceptual term.
//!
//! ## Architecture
//!
//! The crate is organized into several modules:
//!
//! - `core`: Float image containers, color spaces, resampling
//! - `degrade`: Blur, ringing, noise, JPEG and chroma degradations
//! - `augment`: Ordered, probability-gated augmentation pipeline
//! - `random`: Explicit random sources (seeded and scripted)
//! - `nets`: Generator / discriminator / feature extractor contracts
//! - `diff`: Gradient engine contract and a finite-difference engine
//! - `optim`: Losses, momentum, learning-rate schedule, training, evaluation
//! - `metrics`: PSNR on luma
//! - `io`: Image pools, batch loader, checkpoints, preview strips

// Core data structures and pixel math
pub mod core;

// Degradation operators
pub mod degrade;

// Training pair synthesis
pub mod augment;

// Random sources
pub mod random;

// Network contracts and reference networks
pub mod nets;

// Gradient computation
pub mod diff;

// Optimization (training loop, losses, etc.)
pub mod optim;

// Quality metrics
pub mod metrics;

// I/O operations (pools, checkpoints, previews)
pub mod io;

// Re-export commonly used types at crate root for convenience
pub use crate::core::{Image, ImageBatch, Plane};
pub use augment::SamplePair;
pub use optim::{TrainConfig, TrainingSession};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
