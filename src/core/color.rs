//! Color space conversion utilities
//!
//! Single source of truth for the RGB↔YUV and RGB↔HSV transforms used by the
//! degradation pipeline and the PSNR metric.
//!
//! ## YUV
//!
//! Analog YUV (BT.601 luma weights), the same matrices the training data was
//! historically prepared with:
//!
//! ```text
//! Y =  0.299      R + 0.587      G + 0.114      B
//! U = -0.14714119 R - 0.28886916 G + 0.43601035 B
//! V =  0.61497538 R - 0.51496512 G - 0.10001026 B
//! ```
//!
//! For RGB in `[0,1]`, Y is in `[0,1]` and U/V are centered on 0 (roughly
//! `[-0.44, 0.44]` and `[-0.62, 0.62]`). Callers that need an unsigned range
//! add a 0.5 bias themselves.
//!
//! ## HSV
//!
//! Hue is expressed in `[0,1)` (one full turn), saturation and value in `[0,1]`.

use super::image::Image;
use nalgebra::{Matrix3, Vector3};

/// RGB → YUV matrix (column-vector convention).
pub fn rgb_to_yuv_matrix() -> Matrix3<f32> {
    Matrix3::new(
        0.299, 0.587, 0.114,
        -0.147_141_19, -0.288_869_16, 0.436_010_35,
        0.614_975_38, -0.514_965_12, -0.100_010_26,
    )
}

/// YUV → RGB matrix (column-vector convention).
pub fn yuv_to_rgb_matrix() -> Matrix3<f32> {
    Matrix3::new(
        1.0, 0.0, 1.139_883_03,
        1.0, -0.394_642_33, -0.580_621_85,
        1.0, 2.032_061_85, 0.0,
    )
}

/// Luma of one RGB pixel.
#[inline]
pub fn luma(rgb: Vector3<f32>) -> f32 {
    0.299 * rgb.x + 0.587 * rgb.y + 0.114 * rgb.z
}

/// Convert a whole image RGB → YUV (stored as x=Y, y=U, z=V).
pub fn rgb_to_yuv(img: &Image) -> Image {
    let m = rgb_to_yuv_matrix();
    img.map(|p| m * p)
}

/// Convert a whole image YUV → RGB.
pub fn yuv_to_rgb(img: &Image) -> Image {
    let m = yuv_to_rgb_matrix();
    img.map(|p| m * p)
}

/// RGB → HSV for one pixel. Hue in `[0,1)`.
pub fn rgb_to_hsv(rgb: Vector3<f32>) -> Vector3<f32> {
    let (r, g, b) = (rgb.x, rgb.y, rgb.z);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let range = max - min;

    let v = max;
    let s = if max > 0.0 { range / max } else { 0.0 };

    let h = if range <= 0.0 {
        0.0
    } else if max == r {
        (g - b) / range
    } else if max == g {
        2.0 + (b - r) / range
    } else {
        4.0 + (r - g) / range
    };
    let h = (h / 6.0).rem_euclid(1.0);

    Vector3::new(h, s, v)
}

/// HSV → RGB for one pixel. Hue is taken modulo 1.
pub fn hsv_to_rgb(hsv: Vector3<f32>) -> Vector3<f32> {
    let h = hsv.x.rem_euclid(1.0) * 6.0;
    let s = hsv.y;
    let v = hsv.z;

    let c = v * s;
    let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    Vector3::new(r + m, g + m, b + m)
}
