//! Fixed-size 2D convolution kernels for the degradation operators.
//!
//! Both kernels are sampled on a centered grid: for a side of length `n` the
//! coordinates run from `-(n-1)/2` to `+(n-1)/2` in unit steps, so odd sides
//! have an exact center tap and even sides straddle it.
//!
//! Normalization divides by the kernel sum. A kernel that sums to zero (or
//! contains non-finite taps) becomes all zeros instead of producing NaNs.

use std::f32::consts::PI;

/// Row-major `(rows, cols)` float kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    rows: usize,
    cols: usize,
    taps: Vec<f32>,
}

impl Kernel {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn taps(&self) -> &[f32] {
        &self.taps
    }

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.taps[row * self.cols + col]
    }

    pub fn sum(&self) -> f32 {
        self.taps.iter().sum()
    }

    /// Build from raw taps, then normalize with the zero-sum guard.
    fn normalized(rows: usize, cols: usize, mut taps: Vec<f32>) -> Self {
        for t in &mut taps {
            if !t.is_finite() {
                *t = 0.0;
            }
        }
        let sum: f32 = taps.iter().sum();
        if sum == 0.0 || !sum.is_finite() {
            taps.iter_mut().for_each(|t| *t = 0.0);
        } else {
            taps.iter_mut().for_each(|t| *t /= sum);
        }
        Self { rows, cols, taps }
    }
}

fn centered(n: usize) -> impl Iterator<Item = f32> {
    let half = (n as f32 - 1.0) / 2.0;
    (0..n).map(move |i| i as f32 - half)
}

/// Normalized sinc: `sin(πx) / (πx)`, `sinc(0) = 1`.
#[inline]
pub fn sinc(x: f32) -> f32 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

/// Gaussian kernel `exp(-(x² + y²) / (2σ²))`, normalized to sum 1.
///
/// `shape` is `(rows, cols)`. With `sigma == 0` the exponent is taken as 0,
/// which yields a uniform box kernel.
pub fn gaussian_kernel(shape: (usize, usize), sigma: f32) -> Kernel {
    let (rows, cols) = shape;
    let denom = 2.0 * sigma * sigma;
    let mut taps = Vec::with_capacity(rows * cols);
    for y in centered(rows) {
        for x in centered(cols) {
            let r2 = x * x + y * y;
            let exponent = if denom == 0.0 { 0.0 } else { -r2 / denom };
            taps.push(exponent.exp());
        }
    }
    Kernel::normalized(rows, cols, taps)
}

/// Lanczos-style ringing kernel `sinc(d) · sinc(d/σ)`, `d = sqrt(x² + y²)`.
pub fn lanczos_kernel(shape: (usize, usize), sigma: f32) -> Kernel {
    let (rows, cols) = shape;
    let mut taps = Vec::with_capacity(rows * cols);
    for y in centered(rows) {
        for x in centered(cols) {
            let d = (x * x + y * y).sqrt();
            taps.push(sinc(d) * sinc(d / sigma));
        }
    }
    Kernel::normalized(rows, cols, taps)
}
