//! Chroma degradation through a YUV round trip.
//!
//! `rgb_to_yuv_degrade` splits an image into Y/U/V planes, optionally halves
//! the chroma resolution and applies a JPEG quality round trip. U and V carry
//! a +0.5 bias while in plane form so every plane lives in `[0, 1]` (which is
//! what the 8-bit codec expects). `yuv_to_rgb_degrade` undoes the bias and
//! reassembles RGB, resizing chroma back to luma size when needed.

use super::jpeg::{jpeg_roundtrip, DegradeError};
use crate::core::color::{rgb_to_yuv, yuv_to_rgb};
use crate::core::{resize_plane, Image, Plane, Resample};

/// Chroma bias applied to U and V while stored as planes.
pub const CHROMA_BIAS: f32 = 0.5;

/// Y, U and V planes. U/V may be half size and carry `CHROMA_BIAS`.
#[derive(Debug, Clone, PartialEq)]
pub struct YuvPlanes {
    pub y: Plane,
    pub u: Plane,
    pub v: Plane,
}

impl YuvPlanes {
    pub fn is_subsampled(&self) -> bool {
        self.u.dimensions() != self.y.dimensions()
    }
}

/// RGB image to degraded YUV planes.
///
/// - `jpeg_quality`: JPEG round trip on Y (before the chroma bias) and on U/V
///   (after it).
/// - `chroma_subsampling`: resize U/V to `max(1, dim / 2)` with `chroma_method`.
/// - `clip`: clamp all three planes into `[0, 1]`.
pub fn rgb_to_yuv_degrade(
    img: &Image,
    jpeg_quality: Option<u8>,
    chroma_subsampling: bool,
    chroma_method: Resample,
    clip: bool,
) -> Result<YuvPlanes, DegradeError> {
    let yuv = rgb_to_yuv(img);
    let mut y = yuv.channel(0);
    let mut u = yuv.channel(1);
    let mut v = yuv.channel(2);

    if chroma_subsampling {
        let (w, h) = img.dimensions();
        let (cw, ch) = ((w / 2).max(1), (h / 2).max(1));
        u = resize_plane(&u, cw, ch, chroma_method);
        v = resize_plane(&v, cw, ch, chroma_method);
    }

    if let Some(q) = jpeg_quality {
        y = jpeg_roundtrip(&y, q)?;
    }

    u = u.map(|c| c + CHROMA_BIAS);
    v = v.map(|c| c + CHROMA_BIAS);

    if let Some(q) = jpeg_quality {
        u = jpeg_roundtrip(&u, q)?;
        v = jpeg_roundtrip(&v, q)?;
    }

    if clip {
        y = y.clip(0.0, 1.0);
        u = u.clip(0.0, 1.0);
        v = v.clip(0.0, 1.0);
    }

    Ok(YuvPlanes { y, u, v })
}

/// Degraded YUV planes back to an RGB image the size of Y.
pub fn yuv_to_rgb_degrade(planes: &YuvPlanes, chroma_method: Resample, clip: bool) -> Image {
    let (w, h) = planes.y.dimensions();
    let (u, v) = if planes.is_subsampled() || planes.v.dimensions() != (w, h) {
        (
            resize_plane(&planes.u, w, h, chroma_method),
            resize_plane(&planes.v, w, h, chroma_method),
        )
    } else {
        (planes.u.clone(), planes.v.clone())
    };

    let u = u.map(|c| c - CHROMA_BIAS);
    let v = v.map(|c| c - CHROMA_BIAS);
    let rgb = yuv_to_rgb(&Image::from_planes(&planes.y, &u, &v));
    if clip {
        rgb.clip(0.0, 1.0)
    } else {
        rgb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn colorful(w: u32, h: u32) -> Image {
        let pixels = (0..w * h)
            .map(|i| {
                let (x, y) = ((i % w) as f32 / w as f32, (i / w) as f32 / h as f32);
                Vector3::new(x, y, 1.0 - 0.5 * (x + y))
            })
            .collect();
        Image::new(w, h, pixels)
    }

    #[test]
    fn test_lossless_roundtrip() {
        let img = colorful(12, 9);
        let planes = rgb_to_yuv_degrade(&img, None, false, Resample::Area, false).unwrap();
        assert!(!planes.is_subsampled());
        let back = yuv_to_rgb_degrade(&planes, Resample::Bicubic, false);
        assert_eq!(back.dimensions(), img.dimensions());
        for (a, b) in img.pixels().iter().zip(back.pixels()) {
            assert_relative_eq!(a.x, b.x, epsilon = 1e-5);
            assert_relative_eq!(a.y, b.y, epsilon = 1e-5);
            assert_relative_eq!(a.z, b.z, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_chroma_is_biased_and_subsampled() {
        let gray = Image::filled(9, 7, Vector3::new(0.4, 0.4, 0.4));
        let planes = rgb_to_yuv_degrade(&gray, None, true, Resample::Area, true).unwrap();
        assert_eq!(planes.y.dimensions(), (9, 7));
        assert_eq!(planes.u.dimensions(), (4, 3));
        assert_eq!(planes.v.dimensions(), (4, 3));
        assert_relative_eq!(planes.u.get(0, 0), 0.5, epsilon = 1e-6);
        assert_relative_eq!(planes.y.get(3, 3), 0.4, epsilon = 1e-6);

        let back = yuv_to_rgb_degrade(&planes, Resample::Bicubic, true);
        assert_eq!(back.dimensions(), (9, 7));
        assert_relative_eq!(back.get(8, 6).x, 0.4, epsilon = 1e-5);
    }

    #[test]
    fn test_single_pixel_chroma_never_vanishes() {
        let img = Image::filled(1, 1, Vector3::new(0.1, 0.2, 0.3));
        let planes = rgb_to_yuv_degrade(&img, None, true, Resample::Area, true).unwrap();
        assert_eq!(planes.u.dimensions(), (1, 1));
    }

    #[test]
    fn test_jpeg_degrade_stays_in_range() {
        let img = colorful(16, 16);
        let planes = rgb_to_yuv_degrade(&img, Some(70), true, Resample::Area, true).unwrap();
        for plane in [&planes.y, &planes.u, &planes.v] {
            assert!(plane.data().iter().all(|v| (0.0..=1.0).contains(v)));
        }
        let back = yuv_to_rgb_degrade(&planes, Resample::Bicubic, true);
        assert!(back.pixels().iter().all(|p| p.iter().all(|v| (0.0..=1.0).contains(v))));
        // Degraded, but still recognisably the same image.
        let mean_err: f32 = img
            .pixels()
            .iter()
            .zip(back.pixels())
            .map(|(a, b)| (a - b).abs().sum())
            .sum::<f32>()
            / (3 * 256) as f32;
        assert!(mean_err < 0.08);
    }
}
