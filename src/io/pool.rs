//! Source image pools.
//!
//! A pool is an indexable collection of 8-bit RGB images. Training pools are
//! large `.npy` arrays of shape `(N, H, W, 3)` and dtype `uint8`, so
//! [`NpyPool`] memory-maps the file and decodes one image at a time.
//! [`MemoryPool`] holds images directly (tests, small validation sets).

use image::RgbImage;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid .npy file: {0}")]
    InvalidFormat(String),

    #[error("unsupported .npy array: {0}")]
    Unsupported(String),

    #[error("image index {index} out of range (pool holds {len})")]
    OutOfRange { index: usize, len: usize },
}

/// Indexable source of RGB images.
pub trait ImageSource: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> Result<RgbImage, PoolError>;
}

/// In-memory pool.
#[derive(Debug, Clone, Default)]
pub struct MemoryPool {
    images: Vec<RgbImage>,
}

impl MemoryPool {
    pub fn new(images: Vec<RgbImage>) -> Self {
        Self { images }
    }
}

impl ImageSource for MemoryPool {
    fn len(&self) -> usize {
        self.images.len()
    }

    fn get(&self, index: usize) -> Result<RgbImage, PoolError> {
        self.images.get(index).cloned().ok_or(PoolError::OutOfRange {
            index,
            len: self.images.len(),
        })
    }
}

/// Memory-mapped `(N, H, W, 3)` uint8 `.npy` array.
pub struct NpyPool {
    mmap: Mmap,
    data_offset: usize,
    count: usize,
    height: u32,
    width: u32,
}

impl NpyPool {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PoolError> {
        let file = File::open(path.as_ref())?;
        // SAFETY: the map is read-only and pools are not rewritten while training.
        let mmap = unsafe { Mmap::map(&file)? };

        let header = parse_header(&mmap)?;
        let [count, height, width, channels] = header.shape;
        if channels != 3 {
            return Err(PoolError::Unsupported(format!(
                "expected 3 channels, got {channels}"
            )));
        }

        // Random quarter turns must not change the batch geometry.
        if height != width {
            return Err(PoolError::Unsupported(format!(
                "images must be square, got {width}x{height}"
            )));
        }

        let needed = height
            .checked_mul(width)
            .and_then(|n| n.checked_mul(3))
            .and_then(|n| n.checked_mul(count))
            .and_then(|n| n.checked_add(header.data_offset))
            .ok_or_else(|| PoolError::InvalidFormat("shape overflows".into()))?;
        if mmap.len() < needed {
            return Err(PoolError::InvalidFormat(format!(
                "file holds {} bytes, shape needs {}",
                mmap.len(),
                needed
            )));
        }

        Ok(Self {
            mmap,
            data_offset: header.data_offset,
            count,
            height: height as u32,
            width: width as u32,
        })
    }

    /// `(width, height)` of every image in the pool.
    pub fn image_dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl ImageSource for NpyPool {
    fn len(&self) -> usize {
        self.count
    }

    fn get(&self, index: usize) -> Result<RgbImage, PoolError> {
        if index >= self.count {
            return Err(PoolError::OutOfRange {
                index,
                len: self.count,
            });
        }
        let stride = self.width as usize * self.height as usize * 3;
        let start = self.data_offset + index * stride;
        let bytes = self.mmap[start..start + stride].to_vec();
        RgbImage::from_raw(self.width, self.height, bytes)
            .ok_or_else(|| PoolError::InvalidFormat("image buffer size mismatch".into()))
    }
}

struct NpyHeader {
    data_offset: usize,
    shape: [usize; 4],
}

fn parse_header(bytes: &[u8]) -> Result<NpyHeader, PoolError> {
    if bytes.len() < 10 || &bytes[..6] != NPY_MAGIC {
        return Err(PoolError::InvalidFormat("missing NUMPY magic".into()));
    }
    let major = bytes[6];
    let (header_len, prefix) = match major {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err(PoolError::InvalidFormat("truncated header".into()));
            }
            (
                u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
                12,
            )
        }
        v => return Err(PoolError::Unsupported(format!("format version {v}"))),
    };
    let end = prefix + header_len;
    if bytes.len() < end {
        return Err(PoolError::InvalidFormat("truncated header".into()));
    }
    let dict = std::str::from_utf8(&bytes[prefix..end])
        .map_err(|_| PoolError::InvalidFormat("header is not text".into()))?;

    let descr = dict_value(dict, "descr")
        .ok_or_else(|| PoolError::InvalidFormat("header has no 'descr'".into()))?;
    let descr = descr.trim_matches(|c| c == '\'' || c == '"');
    if !matches!(descr, "|u1" | "u1" | "<u1" | ">u1") {
        return Err(PoolError::Unsupported(format!("dtype {descr}, expected uint8")));
    }

    let fortran = dict_value(dict, "fortran_order")
        .ok_or_else(|| PoolError::InvalidFormat("header has no 'fortran_order'".into()))?;
    if fortran.starts_with("True") {
        return Err(PoolError::Unsupported("fortran-ordered arrays".into()));
    }

    let shape_src = dict_value(dict, "shape")
        .ok_or_else(|| PoolError::InvalidFormat("header has no 'shape'".into()))?;
    let dims: Vec<usize> = shape_src
        .trim_start_matches('(')
        .split(')')
        .next()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| PoolError::InvalidFormat(format!("bad shape entry '{s}'")))
        })
        .collect::<Result<_, _>>()?;
    let shape: [usize; 4] = dims.as_slice().try_into().map_err(|_| {
        PoolError::Unsupported(format!("expected a 4-d array (N, H, W, 3), got {dims:?}"))
    })?;

    Ok(NpyHeader {
        data_offset: end,
        shape,
    })
}

/// Text following `'key':` in a Python dict literal.
fn dict_value<'a>(dict: &'a str, key: &str) -> Option<&'a str> {
    let needle_single = format!("'{key}':");
    let needle_double = format!("\"{key}\":");
    let pos = dict
        .find(&needle_single)
        .map(|p| p + needle_single.len())
        .or_else(|| dict.find(&needle_double).map(|p| p + needle_double.len()))?;
    let rest = dict[pos..].trim_start();
    let value = rest.split_once(", '").map_or(rest, |(v, _)| v);
    Some(value.trim_end_matches(|c: char| c == '}' || c == ',' || c.is_whitespace()))
}

/// Write `images` as an `(N, H, W, 3)` uint8 `.npy` file (format 1.0).
///
/// All images must share dimensions.
pub fn write_npy<P: AsRef<Path>>(path: P, images: &[RgbImage]) -> Result<(), PoolError> {
    use std::io::Write;

    let (w, h) = images.first().map_or((0, 0), |img| img.dimensions());
    if images.iter().any(|img| img.dimensions() != (w, h)) {
        return Err(PoolError::InvalidFormat("images differ in size".into()));
    }

    let dict = format!(
        "{{'descr': '|u1', 'fortran_order': False, 'shape': ({}, {}, {}, 3), }}",
        images.len(),
        h,
        w
    );
    // Pad so the data starts on a 64-byte boundary, header ends with '\n'.
    let unpadded = 10 + dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    let header_len = dict.len() + padding + 1;

    let mut out = std::io::BufWriter::new(File::create(path)?);
    out.write_all(NPY_MAGIC)?;
    out.write_all(&[1, 0])?;
    out.write_all(&(header_len as u16).to_le_bytes())?;
    out.write_all(dict.as_bytes())?;
    out.write_all(&vec![b' '; padding])?;
    out.write_all(b"\n")?;
    for img in images {
        out.write_all(img.as_raw())?;
    }
    out.flush()?;
    Ok(())
}
