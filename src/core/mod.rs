//! Core data structures and pixel math.
//!
//! This module contains the fundamental types used throughout the system:
//! - `Image`, `Plane`, `ImageBatch`: dense float image containers
//! - Color space conversions (RGB↔YUV, RGB↔HSV)
//! - Resampling filters (area, bicubic)
//!
//! All types here are "pure data" - no I/O, no randomness.

pub mod color;
mod image;
pub mod resample;

// Re-export public types
pub use self::image::{Image, ImageBatch, Plane};
pub use color::{luma, rgb_to_yuv, yuv_to_rgb};
pub use resample::{downscale_by, resize_image, resize_plane, Resample};
