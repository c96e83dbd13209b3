//! Dense float image containers.
//!
//! - `Image`: one RGB (or YUV/HSV) image, pixels stored row-major as `Vector3<f32>`
//! - `Plane`: one single-channel image (Y/U/V planes, monochrome noise fields)
//! - `ImageBatch`: non-empty list of equally sized images
//!
//! 8-bit data only exists at the I/O boundary (`image::RgbImage`). Everything in
//! between is f32 so degradations can compound without quantizing.

use image::RgbImage;
use nalgebra::Vector3;

/// Row-major 3-channel float image.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<Vector3<f32>>,
}

impl Image {
    pub fn new(width: u32, height: u32, pixels: Vec<Vector3<f32>>) -> Self {
        assert_eq!(
            pixels.len(),
            (width as usize) * (height as usize),
            "pixel count does not match {width}x{height}"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn filled(width: u32, height: u32, value: Vector3<f32>) -> Self {
        Self::new(width, height, vec![value; (width as usize) * (height as usize)])
    }

    /// Scale an 8-bit image into `[0,1]`.
    pub fn from_rgb8(img: &RgbImage) -> Self {
        let pixels = img
            .pixels()
            .map(|p| Vector3::new(p[0] as f32, p[1] as f32, p[2] as f32) / 255.0)
            .collect();
        Self::new(img.width(), img.height(), pixels)
    }

    /// Map `[lo, hi]` onto `[0, 255]`, clip, and truncate to 8-bit.
    pub fn to_rgb8_scaled(&self, lo: f32, hi: f32) -> RgbImage {
        let to_u8 = |v: f32| (((v - lo) / (hi - lo)) * 255.0).clamp(0.0, 255.0) as u8;
        let mut out = RgbImage::new(self.width, self.height);
        for (dst, p) in out.pixels_mut().zip(&self.pixels) {
            *dst = image::Rgb([to_u8(p.x), to_u8(p.y), to_u8(p.z)]);
        }
        out
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[Vector3<f32>] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Vector3<f32>] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<Vector3<f32>> {
        self.pixels
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Vector3<f32> {
        self.pixels[(y as usize) * (self.width as usize) + x as usize]
    }

    pub fn map(&self, f: impl Fn(Vector3<f32>) -> Vector3<f32>) -> Self {
        Self::new(self.width, self.height, self.pixels.iter().map(|&p| f(p)).collect())
    }

    /// Clamp every channel into `[lo, hi]`.
    pub fn clip(&self, lo: f32, hi: f32) -> Self {
        self.map(|p| p.map(|v| v.clamp(lo, hi)))
    }

    /// Single channel `c` (0, 1 or 2) as a plane.
    pub fn channel(&self, c: usize) -> Plane {
        Plane::new(self.width, self.height, self.pixels.iter().map(|p| p[c]).collect())
    }

    /// Stack three equally sized planes into one image.
    pub fn from_planes(a: &Plane, b: &Plane, c: &Plane) -> Self {
        assert_eq!(a.dimensions(), b.dimensions());
        assert_eq!(a.dimensions(), c.dimensions());
        let pixels = a
            .data()
            .iter()
            .zip(b.data())
            .zip(c.data())
            .map(|((&x, &y), &z)| Vector3::new(x, y, z))
            .collect();
        Self::new(a.width(), a.height(), pixels)
    }

    /// Mirror left/right.
    pub fn flip_horizontal(&self) -> Self {
        let w = self.width as usize;
        let mut pixels = Vec::with_capacity(self.pixels.len());
        for row in self.pixels.chunks_exact(w.max(1)) {
            pixels.extend(row.iter().rev());
        }
        Self::new(self.width, self.height, pixels)
    }

    /// Rotate counter-clockwise by `k` quarter turns.
    pub fn rotate90(&self, k: u32) -> Self {
        let mut out = self.clone();
        for _ in 0..(k % 4) {
            out = out.rotate90_once();
        }
        out
    }

    fn rotate90_once(&self) -> Self {
        let (w, h) = (self.width as usize, self.height as usize);
        // New image is h wide and w tall; new[y'][x'] = old[x'][w - 1 - y'].
        let mut pixels = Vec::with_capacity(self.pixels.len());
        for ny in 0..w {
            for nx in 0..h {
                pixels.push(self.pixels[nx * w + (w - 1 - ny)]);
            }
        }
        Self::new(self.height, self.width, pixels)
    }

    /// Mean of each channel over all pixels.
    pub fn channel_means(&self) -> Vector3<f32> {
        let mut acc = Vector3::<f32>::zeros();
        for p in &self.pixels {
            acc += *p;
        }
        acc / (self.pixels.len() as f32).max(1.0)
    }
}

/// Row-major single-channel float image.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl Plane {
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            (width as usize) * (height as usize),
            "sample count does not match {width}x{height}"
        );
        Self {
            width,
            height,
            data,
        }
    }

    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        Self::new(width, height, vec![value; (width as usize) * (height as usize)])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y as usize) * (self.width as usize) + x as usize]
    }

    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self::new(self.width, self.height, self.data.iter().map(|&v| f(v)).collect())
    }

    pub fn clip(&self, lo: f32, hi: f32) -> Self {
        self.map(|v| v.clamp(lo, hi))
    }
}

/// Non-empty list of equally sized images (the leading "batch" dimension).
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBatch {
    images: Vec<Image>,
}

impl ImageBatch {
    pub fn new(images: Vec<Image>) -> Self {
        assert!(!images.is_empty(), "an image batch cannot be empty");
        let dims = images[0].dimensions();
        assert!(
            images.iter().all(|img| img.dimensions() == dims),
            "all images in a batch must share dimensions"
        );
        Self { images }
    }

    /// Wrap one image as a batch of size 1.
    pub fn single(image: Image) -> Self {
        Self {
            images: vec![image],
        }
    }

    /// Collapse a batch of size 1 back into its image.
    pub fn into_single(mut self) -> Image {
        assert_eq!(self.images.len(), 1, "expected a batch of exactly one image");
        self.images.remove(0)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// (width, height) shared by every image.
    pub fn dimensions(&self) -> (u32, u32) {
        self.images[0].dimensions()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Image> {
        self.images.iter()
    }

    pub fn map(&self, f: impl Fn(&Image) -> Image) -> Self {
        Self::new(self.images.iter().map(f).collect())
    }

    /// Total number of scalar elements (batch * height * width * 3).
    pub fn element_count(&self) -> usize {
        let (w, h) = self.dimensions();
        self.images.len() * (w as usize) * (h as usize) * 3
    }

    /// Iterate every scalar in batch/row/column/channel order.
    pub fn scalars(&self) -> impl Iterator<Item = f32> + '_ {
        self.images
            .iter()
            .flat_map(|img| img.pixels().iter().flat_map(|p| [p.x, p.y, p.z]))
    }
}
