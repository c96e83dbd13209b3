//! Validation pairs are deterministic and exactly 4x apart.

use approx::assert_relative_eq;
use image::RgbImage;
use srgan_rs::augment::{augment_valid, Pipeline};
use srgan_rs::random::SeededSource;

#[test]
fn test_gray_image_stays_gray() {
    let src = RgbImage::from_pixel(256, 256, image::Rgb([128, 128, 128]));
    let pair = augment_valid(&src);

    assert_eq!(pair.hr.dimensions(), (256, 256));
    assert_eq!(pair.lr.dimensions(), (64, 64));
    for p in pair.hr.pixels().iter().chain(pair.lr.pixels()) {
        for &v in p.iter() {
            assert_relative_eq!(v, 128.0 / 255.0, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_valid_pairs_are_bit_identical() {
    let src = RgbImage::from_fn(48, 40, |x, y| image::Rgb([(x * 5) as u8, (y * 6) as u8, ((x + y) * 2) as u8]));
    let a = augment_valid(&src);
    let b = augment_valid(&src);
    assert_eq!(a, b);
    assert_eq!(a.lr.dimensions(), (12, 10));
}

#[test]
fn test_training_pairs_stay_in_unit_range() {
    let src = RgbImage::from_fn(32, 32, |x, y| image::Rgb([(x * 8) as u8, (y * 8) as u8, 200]));
    let pipeline = Pipeline::training();
    for seed in 0..16 {
        let pair = pipeline.run(&src, &mut SeededSource::new(seed)).unwrap();
        assert_eq!(pair.hr.dimensions(), (32, 32));
        assert_eq!(pair.lr.dimensions(), (8, 8));
        for p in pair.lr.pixels().iter().chain(pair.hr.pixels()) {
            assert!(p.iter().all(|v| (0.0..=1.0).contains(v)), "value out of range: {p:?}");
        }
    }
}
