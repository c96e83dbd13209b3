//! Image degradation operators used to synthesize low-resolution inputs.
//!
//! - `kernel`: Gaussian and Lanczos convolution kernels
//! - `blur`: reflect-padded depthwise convolution (blur, ringing)
//! - `noise`: additive Gaussian noise
//! - `jpeg`: 8-bit JPEG quality round trip on a plane
//! - `yuv`: chroma subsampling and compression through YUV planes

pub mod blur;
pub mod jpeg;
pub mod kernel;
pub mod noise;
pub mod yuv;

pub use blur::{blur_gaussian, convolve_image, convolve_plane, ring_artifact};
pub use jpeg::{jpeg_roundtrip, DegradeError};
pub use kernel::{gaussian_kernel, lanczos_kernel, Kernel};
pub use noise::{noise_gaussian, LowFrequency};
pub use yuv::{rgb_to_yuv_degrade, yuv_to_rgb_degrade, YuvPlanes};
