//! Image quality metrics.

use crate::core::{luma, Image, ImageBatch};

/// Added to every squared difference so identical images give a finite score.
pub const MSE_FLOOR: f64 = 1e-8;

fn squared_luma_errors<'a>(a: &'a Image, b: &'a Image) -> impl Iterator<Item = f64> + 'a {
    a.pixels().iter().zip(b.pixels()).map(|(&p, &q)| {
        let d = luma(p) as f64 * 255.0 - luma(q) as f64 * 255.0;
        d * d + MSE_FLOOR
    })
}

fn psnr_from_mse(mse: f64) -> f64 {
    10.0 * (255.0f64 * 255.0 / mse).log10()
}

/// PSNR in dB on the luma (Y) channel of two `[0, 1]` RGB images.
///
/// Panics if the shapes differ.
pub fn psnr_image(a: &Image, b: &Image) -> f64 {
    assert_eq!(a.dimensions(), b.dimensions(), "psnr: shape mismatch");
    let n = a.pixels().len().max(1) as f64;
    psnr_from_mse(squared_luma_errors(a, b).sum::<f64>() / n)
}

/// PSNR over a whole batch (one mean over every pixel of every image).
pub fn psnr(a: &ImageBatch, b: &ImageBatch) -> f64 {
    assert_eq!(a.len(), b.len(), "psnr: batch size mismatch");
    assert_eq!(a.dimensions(), b.dimensions(), "psnr: shape mismatch");
    let (sum, n) = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (squared_luma_errors(x, y).sum::<f64>(), x.pixels().len()))
        .fold((0.0, 0usize), |(s, c), (ds, dc)| (s + ds, c + dc));
    psnr_from_mse(sum / n.max(1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_identical_images_hit_the_floor() {
        let img = Image::filled(4, 4, Vector3::new(0.3, 0.6, 0.1));
        let expected = 10.0 * (255.0f64 * 255.0 / 1e-8).log10();
        assert_relative_eq!(psnr_image(&img, &img), expected, epsilon = 1e-6);
        assert_relative_eq!(expected, 128.13, epsilon = 0.01);
    }

    #[test]
    fn test_known_offset() {
        // Gray offset of 1/255 is exactly one luma level: mse ≈ 1, psnr ≈ 48.13 dB.
        let a = Image::filled(8, 8, Vector3::new(0.5, 0.5, 0.5));
        let b = a.map(|p| p.add_scalar(1.0 / 255.0));
        assert_relative_eq!(psnr_image(&a, &b), 48.1308, epsilon = 1e-3);
    }

    #[test]
    fn test_batch_matches_single_image() {
        let a = Image::filled(4, 4, Vector3::new(0.2, 0.2, 0.2));
        let b = Image::filled(4, 4, Vector3::new(0.25, 0.2, 0.2));
        let single = psnr_image(&a, &b);
        let batch = psnr(&ImageBatch::single(a), &ImageBatch::single(b));
        assert_relative_eq!(single, batch, epsilon = 1e-9);
    }

    #[test]
    #[should_panic(expected = "shape mismatch")]
    fn test_shape_mismatch_panics() {
        let a = Image::filled(4, 4, Vector3::zeros());
        let b = Image::filled(4, 5, Vector3::zeros());
        psnr_image(&a, &b);
    }
}
