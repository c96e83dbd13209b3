//! Blur and ringing operators (depthwise convolution with reflect padding).
//!
//! The image is padded by `shape / 2` on every spatial edge using mirror
//! reflection *without* repeating the edge sample (`[a b c]` pads to
//! `[c b | a b c | b a]`), then convolved in VALID mode. For odd kernel sides
//! the output has exactly the input size, and reflection keeps the image mean
//! from drifting toward a constant border color.
//!
//! Every channel is convolved with the same kernel (depthwise).

use super::kernel::{gaussian_kernel, lanczos_kernel, Kernel};
use crate::core::{Image, Plane};
use nalgebra::Vector3;
use std::ops::{Add, Mul};

/// Values a kernel can blend: plane samples and RGB pixels.
trait Sample: Copy + Add<Output = Self> + Mul<f32, Output = Self> {
    fn zero() -> Self;
}

impl Sample for f32 {
    fn zero() -> Self {
        0.0
    }
}

impl Sample for Vector3<f32> {
    fn zero() -> Self {
        Vector3::zeros()
    }
}

/// Mirror an out-of-range index back into `0..n` (no edge repeat).
#[inline]
fn reflect_index(i: i64, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n as i64 - 1);
    let m = i.rem_euclid(period);
    if m < n as i64 {
        m as usize
    } else {
        (period - m) as usize
    }
}

/// Reflect-pad then VALID-convolve a row-major buffer. Returns (data, width, height).
fn convolve_reflect<T: Sample>(
    src: &[T],
    width: usize,
    height: usize,
    kernel: &Kernel,
) -> (Vec<T>, usize, usize) {
    let (kh, kw) = (kernel.rows(), kernel.cols());
    let (pad_y, pad_x) = (kh / 2, kw / 2);
    let out_w = width + 2 * pad_x + 1 - kw;
    let out_h = height + 2 * pad_y + 1 - kh;

    // Precompute source indices of the padded grid per axis.
    let cols: Vec<usize> = (0..width + 2 * pad_x)
        .map(|px| reflect_index(px as i64 - pad_x as i64, width))
        .collect();
    let rows: Vec<usize> = (0..height + 2 * pad_y)
        .map(|py| reflect_index(py as i64 - pad_y as i64, height))
        .collect();

    let mut out = Vec::with_capacity(out_w * out_h);
    for y in 0..out_h {
        for x in 0..out_w {
            let mut acc = T::zero();
            for r in 0..kh {
                let row = rows[y + r] * width;
                for c in 0..kw {
                    acc = acc + src[row + cols[x + c]] * kernel.at(r, c);
                }
            }
            out.push(acc);
        }
    }
    (out, out_w, out_h)
}

/// Convolve an image with `kernel`, preserving size for odd kernel sides.
pub fn convolve_image(img: &Image, kernel: &Kernel) -> Image {
    let (data, w, h) = convolve_reflect(
        img.pixels(),
        img.width() as usize,
        img.height() as usize,
        kernel,
    );
    Image::new(w as u32, h as u32, data)
}

/// Convolve a single plane with `kernel`.
pub fn convolve_plane(plane: &Plane, kernel: &Kernel) -> Plane {
    let (data, w, h) = convolve_reflect(
        plane.data(),
        plane.width() as usize,
        plane.height() as usize,
        kernel,
    );
    Plane::new(w as u32, h as u32, data)
}

/// Gaussian blur. `shape` should have odd sides.
pub fn blur_gaussian(img: &Image, sigma: f32, shape: (usize, usize), clip: bool) -> Image {
    let out = convolve_image(img, &gaussian_kernel(shape, sigma));
    if clip {
        out.clip(0.0, 1.0)
    } else {
        out
    }
}

/// Ringing / haloing artifact via the Lanczos kernel. `shape` should have odd sides.
pub fn ring_artifact(img: &Image, sigma: f32, shape: (usize, usize), clip: bool) -> Image {
    let out = convolve_image(img, &lanczos_kernel(shape, sigma));
    if clip {
        out.clip(0.0, 1.0)
    } else {
        out
    }
}
