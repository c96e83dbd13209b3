//! Additive Gaussian noise, optionally low-frequency ("colored") noise.

use super::blur::{convolve_image, convolve_plane};
use super::kernel::gaussian_kernel;
use crate::core::{Image, Plane};
use crate::random::RandomSource;
use nalgebra::Vector3;

/// Low-frequency shaping for the noise field: blur it before adding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowFrequency {
    pub sigma: f32,
    pub shape: (usize, usize),
}

impl Default for LowFrequency {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            shape: (7, 7),
        }
    }
}

/// Add zero-mean Gaussian noise of standard deviation `sigma`.
///
/// With `color` each channel gets an independent draw; otherwise one draw per
/// pixel is shared by all three channels (luma-only noise). The noise field is
/// blurred, unclipped, when `low_freq` is given.
pub fn noise_gaussian(
    img: &Image,
    sigma: f32,
    color: bool,
    low_freq: Option<LowFrequency>,
    clip: bool,
    rng: &mut dyn RandomSource,
) -> Image {
    let (w, h) = img.dimensions();
    let n = img.pixels().len();

    let field: Vec<Vector3<f32>> = if color {
        let raw = Image::new(
            w,
            h,
            (0..n)
                .map(|_| Vector3::new(rng.gaussian(), rng.gaussian(), rng.gaussian()) * sigma)
                .collect(),
        );
        match low_freq {
            Some(lf) => convolve_image(&raw, &gaussian_kernel(lf.shape, lf.sigma)).into_pixels(),
            None => raw.into_pixels(),
        }
    } else {
        let raw = Plane::new(w, h, (0..n).map(|_| rng.gaussian() * sigma).collect());
        let plane = match low_freq {
            Some(lf) => convolve_plane(&raw, &gaussian_kernel(lf.shape, lf.sigma)),
            None => raw,
        };
        plane.into_data().into_iter().map(|v| Vector3::new(v, v, v)).collect()
    };

    let pixels = img.pixels().iter().zip(&field).map(|(p, n)| p + n).collect();
    let out = Image::new(w, h, pixels);
    if clip {
        out.clip(0.0, 1.0)
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ScriptedSource, SeededSource};
    use approx::assert_relative_eq;

    #[test]
    fn test_monochrome_noise_is_shared_across_channels() {
        let img = Image::filled(6, 4, Vector3::new(0.5, 0.5, 0.5));
        let mut rng = SeededSource::new(3);
        let out = noise_gaussian(&img, 0.1, false, None, false, &mut rng);
        for p in out.pixels() {
            assert_eq!(p.x, p.y);
            assert_eq!(p.y, p.z);
        }
        assert!(out.pixels().iter().any(|p| (p.x - 0.5).abs() > 1e-4));
    }

    #[test]
    fn test_color_noise_differs_per_channel() {
        let img = Image::filled(6, 4, Vector3::new(0.5, 0.5, 0.5));
        let mut rng = SeededSource::new(3);
        let out = noise_gaussian(&img, 0.1, true, None, false, &mut rng);
        assert!(out.pixels().iter().any(|p| p.x != p.y));
    }

    #[test]
    fn test_constant_noise_shifts_and_clips() {
        let img = Image::filled(4, 4, Vector3::new(0.9, 0.9, 0.9));
        let mut rng = ScriptedSource::new([]).with_gaussian(1.0);
        let out = noise_gaussian(&img, 0.05, true, Some(LowFrequency::default()), false, &mut rng);
        // A constant field survives the low-frequency blur unchanged.
        assert_relative_eq!(out.get(2, 2).x, 0.95, epsilon = 1e-5);

        let mut rng = ScriptedSource::new([]).with_gaussian(1.0);
        let clipped = noise_gaussian(&img, 0.5, false, None, true, &mut rng);
        assert_eq!(clipped.get(0, 0).x, 1.0);
    }

    #[test]
    fn test_low_frequency_noise_has_lower_variance() {
        let img = Image::filled(32, 32, Vector3::zeros());
        let variance = |im: &Image| {
            let n = im.pixels().len() as f32;
            let mean = im.pixels().iter().map(|p| p.x).sum::<f32>() / n;
            im.pixels().iter().map(|p| (p.x - mean).powi(2)).sum::<f32>() / n
        };
        let white = noise_gaussian(&img, 0.2, true, None, false, &mut SeededSource::new(11));
        let colored = noise_gaussian(
            &img,
            0.2,
            true,
            Some(LowFrequency { sigma: 2.0, shape: (7, 7) }),
            false,
            &mut SeededSource::new(11),
        );
        assert!(variance(&colored) < 0.5 * variance(&white));
    }
}
