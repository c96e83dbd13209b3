//! Photometric jitter: hue rotation and contrast scaling.

use crate::core::color::{hsv_to_rgb, rgb_to_hsv};
use crate::core::Image;

/// Rotate every pixel's hue by `delta` (in turns, wraps modulo 1).
pub fn adjust_hue(img: &Image, delta: f32) -> Image {
    img.map(|p| {
        let mut hsv = rgb_to_hsv(p);
        hsv.x = (hsv.x + delta).rem_euclid(1.0);
        hsv_to_rgb(hsv)
    })
}

/// Scale each channel's deviation from its spatial mean by `factor`.
///
/// Not clipped; the pipeline clips right after.
pub fn adjust_contrast(img: &Image, factor: f32) -> Image {
    let mean = img.channel_means();
    img.map(|p| (p - mean) * factor + mean)
}
