//! Preview strips: a few images of a batch side by side in one PNG.

use crate::core::ImageBatch;
use anyhow::{Context, Result};
use image::RgbImage;
use std::path::Path;

/// Concatenate up to `max` images of `batch` horizontally.
///
/// Values in `val_range` map onto `[0, 255]`; anything outside is clipped.
pub fn strip(batch: &ImageBatch, max: usize, val_range: (f32, f32)) -> RgbImage {
    let (w, h) = batch.dimensions();
    let n = batch.len().min(max.max(1));
    let mut out = RgbImage::new(w * n as u32, h);
    for (i, img) in batch.iter().take(n).enumerate() {
        let tile = img.to_rgb8_scaled(val_range.0, val_range.1);
        image::imageops::replace(&mut out, &tile, (i as u32 * w) as i64, 0);
    }
    out
}

/// Write [`strip`] to `path` as PNG.
pub fn save_strip(batch: &ImageBatch, max: usize, val_range: (f32, f32), path: &Path) -> Result<()> {
    strip(batch, max, val_range)
        .save(path)
        .with_context(|| format!("Failed to write preview {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Image;
    use nalgebra::Vector3;

    #[test]
    fn test_strip_layout_and_scaling() {
        let batch = ImageBatch::new(vec![
            Image::filled(3, 2, Vector3::new(-1.0, -1.0, -1.0)),
            Image::filled(3, 2, Vector3::new(1.0, 1.0, 1.0)),
            Image::filled(3, 2, Vector3::new(0.0, 0.0, 0.0)),
        ]);
        let out = strip(&batch, 2, (-1.0, 1.0));
        assert_eq!(out.dimensions(), (6, 2));
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(3, 1)[2], 255);
    }

    #[test]
    fn test_save_strip_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train_10.png");
        let batch = ImageBatch::single(Image::filled(4, 4, Vector3::new(0.5, 0.2, 0.1)));
        save_strip(&batch, 4, (0.0, 1.0), &path).unwrap();
        let loaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(loaded.dimensions(), (4, 4));
        assert_eq!(loaded.get_pixel(1, 1)[0], 127);
    }
}
