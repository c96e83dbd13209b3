//! Evaluation: run the saved generator on one held-out image.

use crate::augment::augment_valid;
use crate::core::{Image, ImageBatch};
use crate::io::checkpoint::{generator_path, load_checkpoint};
use crate::io::pool::ImageSource;
use crate::nets::Generator;
use anyhow::{bail, Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the generated image inside the results directory.
pub const GENERATED_FILE: &str = "valid_gen.png";

/// What [`evaluate`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalOutputs {
    pub lr_size: (u32, u32),
    pub generated_size: (u32, u32),
    pub generated_path: PathBuf,
}

/// `clip(((out - 0) / (1 - 0)) * 255, 0, 255)` cast to 8-bit.
///
/// The generator output is nominally in `[-1, 1]`, but it is scaled as if it
/// were in `[0, 1]`, so negative values clip to black.
pub fn to_rgb8_eval(out: &Image) -> RgbImage {
    out.to_rgb8_scaled(0.0, 1.0)
}

/// Load `g.ckpt` from `checkpoint_dir`, upscale pool image `image_index` and
/// write `valid_gen.png` (plus `valid_lr.png` / `valid_hr.png`) into `save_dir`.
pub fn evaluate<G: Generator>(
    generator: &G,
    pool: &dyn ImageSource,
    image_index: usize,
    checkpoint_dir: &Path,
    save_dir: &Path,
) -> Result<EvalOutputs> {
    let ckpt = generator_path(checkpoint_dir);
    let (weights, meta) =
        load_checkpoint(&ckpt).with_context(|| format!("Failed to load {}", ckpt.display()))?;
    info!(path = %ckpt.display(), epoch = meta.epoch, step = meta.step, "loaded generator");

    if image_index >= pool.len() {
        bail!(
            "evaluation image {} out of range (pool holds {})",
            image_index,
            pool.len()
        );
    }
    let src = pool
        .get(image_index)
        .with_context(|| format!("Failed to read evaluation image {image_index}"))?;
    let pair = augment_valid(&src);

    let out = generator
        .upscale(&weights, &ImageBatch::single(pair.lr.clone()))
        .into_single();
    let lr_size = pair.lr.dimensions();
    let generated_size = out.dimensions();
    info!(
        lr_width = lr_size.0,
        lr_height = lr_size.1,
        gen_width = generated_size.0,
        gen_height = generated_size.1,
        "LR size / generated HR size"
    );

    std::fs::create_dir_all(save_dir)
        .with_context(|| format!("Failed to create {}", save_dir.display()))?;
    let generated_path = save_dir.join(GENERATED_FILE);
    info!("save images");
    to_rgb8_eval(&out)
        .save(&generated_path)
        .with_context(|| format!("Failed to write {}", generated_path.display()))?;
    for (name, img) in [("valid_lr.png", &pair.lr), ("valid_hr.png", &pair.hr)] {
        let path = save_dir.join(name);
        img.to_rgb8_scaled(0.0, 1.0)
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok(EvalOutputs {
        lr_size,
        generated_size,
        generated_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_eval_rescale_clips_negative_outputs() {
        let img = Image::new(
            3,
            1,
            vec![
                Vector3::new(-0.5, -1.0, 0.0),
                Vector3::new(0.5, 0.25, 1.0),
                Vector3::new(1.5, 0.999, 0.1),
            ],
        );
        let out = to_rgb8_eval(&img);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(1, 0).0, [127, 63, 255]);
        assert_eq!(out.get_pixel(2, 0).0, [255, 254, 25]);
    }
}
