//! JPEG quality round trip on a single plane.
//!
//! The plane is quantized to 8 bits (saturating), encoded as a grayscale
//! baseline JPEG at the requested quality, decoded again and mapped back to
//! `[0, 1]`. This is how compression blocking and quantization noise are
//! injected into the low-resolution training input.

use crate::core::Plane;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageFormat};
use thiserror::Error;

/// Errors from the codec-backed degradation operators.
#[derive(Debug, Error)]
pub enum DegradeError {
    #[error("JPEG codec error: {0}")]
    Codec(#[from] image::ImageError),

    #[error("decoded plane is {got:?}, expected {expected:?}")]
    SizeMismatch {
        expected: (u32, u32),
        got: (u32, u32),
    },
}

/// Saturating `[0, 1] -> u8` quantization.
fn quantize(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Encode and decode `plane` as a JPEG at `quality` (1..=100).
pub fn jpeg_roundtrip(plane: &Plane, quality: u8) -> Result<Plane, DegradeError> {
    let (w, h) = plane.dimensions();
    let bytes: Vec<u8> = plane.data().iter().map(|&v| quantize(v)).collect();

    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, quality.clamp(1, 100)).encode(
        &bytes,
        w,
        h,
        ExtendedColorType::L8,
    )?;

    let decoded = image::load_from_memory_with_format(&encoded, ImageFormat::Jpeg)?.to_luma8();
    if decoded.dimensions() != (w, h) {
        return Err(DegradeError::SizeMismatch {
            expected: (w, h),
            got: decoded.dimensions(),
        });
    }

    let data = decoded.into_raw().into_iter().map(|b| b as f32 / 255.0).collect();
    Ok(Plane::new(w, h, data))
}
