//! Image resampling on float buffers via `fast_image_resize`.
//!
//! Images resize as `F32x3` and planes as `F32`, so values outside `[0, 1]`
//! (chroma planes, generator output) pass through unclamped.
//!
//! - `Area`: box filter. For integer downscale factors this is the block mean.
//! - `Bicubic`: Catmull-Rom convolution.

use super::image::{Image, Plane};
use fast_image_resize as fir;
use nalgebra::Vector3;

/// Resampling method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resample {
    Area,
    Bicubic,
}

impl Resample {
    fn to_fir_alg(self) -> fir::ResizeAlg {
        match self {
            Resample::Area => fir::ResizeAlg::Convolution(fir::FilterType::Box),
            Resample::Bicubic => fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom),
        }
    }
}

/// Resize interleaved f32 samples with `channels` per pixel (1 or 3).
fn fir_resize(
    samples: Vec<f32>,
    channels: usize,
    src: (u32, u32),
    dst: (u32, u32),
    method: Resample,
) -> Vec<f32> {
    let pixel_type = match channels {
        1 => fir::pixels::PixelType::F32,
        _ => fir::pixels::PixelType::F32x3,
    };
    let mut src_buf = samples;
    let mut dst_buf = vec![0.0f32; dst.0 as usize * dst.1 as usize * channels];
    {
        // Both buffers are f32-aligned and sized from their own dimensions.
        let src_image =
            fir::images::Image::from_slice_u8(src.0, src.1, bytemuck::cast_slice_mut(&mut src_buf), pixel_type)
                .expect("source buffer matches its dimensions");
        let mut dst_image =
            fir::images::Image::from_slice_u8(dst.0, dst.1, bytemuck::cast_slice_mut(&mut dst_buf), pixel_type)
                .expect("destination buffer matches its dimensions");
        let options = fir::ResizeOptions::new().resize_alg(method.to_fir_alg());
        fir::Resizer::new()
            .resize(&src_image, &mut dst_image, &options)
            .expect("source and destination share a pixel type");
    }
    dst_buf
}

/// Resize an RGB image to `(new_width, new_height)`.
pub fn resize_image(img: &Image, new_width: u32, new_height: u32, method: Resample) -> Image {
    assert!(new_width > 0 && new_height > 0, "cannot resize to an empty image");
    if img.dimensions() == (new_width, new_height) {
        return img.clone();
    }
    let flat = img.pixels().iter().flat_map(|p| [p.x, p.y, p.z]).collect();
    let out = fir_resize(flat, 3, img.dimensions(), (new_width, new_height), method);
    let pixels = out
        .chunks_exact(3)
        .map(|c| Vector3::new(c[0], c[1], c[2]))
        .collect();
    Image::new(new_width, new_height, pixels)
}

/// Resize a single plane to `(new_width, new_height)`.
pub fn resize_plane(plane: &Plane, new_width: u32, new_height: u32, method: Resample) -> Plane {
    assert!(new_width > 0 && new_height > 0, "cannot resize to an empty plane");
    if plane.dimensions() == (new_width, new_height) {
        return plane.clone();
    }
    let out = fir_resize(
        plane.data().to_vec(),
        1,
        plane.dimensions(),
        (new_width, new_height),
        method,
    );
    Plane::new(new_width, new_height, out)
}

/// Downsample by an integer factor (floor division of both sides).
pub fn downscale_by(img: &Image, factor: u32, method: Resample) -> Image {
    resize_image(
        img,
        (img.width() / factor).max(1),
        (img.height() / factor).max(1),
        method,
    )
}
