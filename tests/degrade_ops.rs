//! Degradation operators on randomized images.

use approx::assert_relative_eq;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use srgan_rs::core::{Image, Resample};
use srgan_rs::degrade::{
    blur_gaussian, gaussian_kernel, rgb_to_yuv_degrade, ring_artifact, yuv_to_rgb_degrade,
};

fn random_image(w: u32, h: u32, seed: u64) -> Image {
    let mut rng = StdRng::seed_from_u64(seed);
    let pixels = (0..w * h)
        .map(|_| Vector3::new(rng.gen::<f32>(), rng.gen::<f32>(), rng.gen::<f32>()))
        .collect();
    Image::new(w, h, pixels)
}

#[test]
fn test_yuv_roundtrip_without_jpeg_or_subsampling() {
    let img = random_image(17, 11, 1);
    let planes = rgb_to_yuv_degrade(&img, None, false, Resample::Area, false).unwrap();
    let back = yuv_to_rgb_degrade(&planes, Resample::Bicubic, false);
    for (a, b) in img.pixels().iter().zip(back.pixels()) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-4);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-4);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-4);
    }
}

#[test]
fn test_gaussian_kernels_sum_to_one() {
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..20 {
        let side = 2 * rng.gen_range(0..4) + 1;
        let sigma = rng.gen_range(0.1f32..5.0);
        let k = gaussian_kernel((side, side), sigma);
        assert_relative_eq!(k.sum(), 1.0, epsilon = 1e-5);
    }
}

#[test]
fn test_blur_and_ring_keep_mean_and_size() {
    let img = random_image(24, 24, 3);
    let mean = img.channel_means();
    for out in [
        blur_gaussian(&img, 1.0, (5, 5), true),
        ring_artifact(&img, 3.0, (5, 5), false),
    ] {
        assert_eq!(out.dimensions(), (24, 24));
        let m = out.channel_means();
        assert!((m - mean).abs().max() < 0.02, "mean drifted from {mean:?} to {m:?}");
    }
}

#[test]
fn test_chroma_subsampling_with_jpeg() {
    let img = random_image(32, 24, 4);
    let planes = rgb_to_yuv_degrade(&img, Some(80), true, Resample::Area, true).unwrap();
    assert_eq!(planes.y.dimensions(), (32, 24));
    assert_eq!(planes.u.dimensions(), (16, 12));
    let back = yuv_to_rgb_degrade(&planes, Resample::Bicubic, true);
    assert_eq!(back.dimensions(), (32, 24));
}
