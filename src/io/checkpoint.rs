//! Binary checkpoint format for network weights.
//!
//! File names: `g.ckpt` (generator) and `d.ckpt` (discriminator) inside the
//! checkpoint directory.
//!
//! Layout:
//! ```text
//! Header (64 bytes):
//!   - Magic: "SRGANCK\0" (8 bytes)
//!   - Version: u32 (4 bytes)
//!   - Weight count: u64 (8 bytes)
//!   - Epoch: u64 (8 bytes) - last completed epoch (per phase)
//!   - Global step: u64 (8 bytes)
//!   - Learning rate: f32 (4 bytes)
//!   - Compression: u32 (4 bytes) - 0=none, 1=lz4
//!   - Reserved: 20 bytes
//!
//! Payload:
//!   - Weights: count × f32, little endian
//!   - With LZ4: u64 uncompressed size, then the size-prepended LZ4 block
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const MAGIC: &[u8; 8] = b"SRGANCK\0";
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 64;

/// Generator checkpoint file name.
pub const GENERATOR_FILE: &str = "g.ckpt";
/// Discriminator checkpoint file name.
pub const DISCRIMINATOR_FILE: &str = "d.ckpt";

/// Payload compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None = 0,
    #[cfg(feature = "lz4")]
    Lz4 = 1,
}

/// Checkpoint header fields besides the weights themselves.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CheckpointMeta {
    pub epoch: u64,
    pub step: u64,
    pub learning_rate: f32,
    pub compression: Compression,
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid file magic (not a checkpoint)")]
    InvalidMagic,

    #[error("unsupported checkpoint version: {0}")]
    UnsupportedVersion(u32),

    #[error("unsupported compression: {0}")]
    UnsupportedCompression(u32),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// `<dir>/g.ckpt`
pub fn generator_path(dir: &Path) -> PathBuf {
    dir.join(GENERATOR_FILE)
}

/// `<dir>/d.ckpt`
pub fn discriminator_path(dir: &Path) -> PathBuf {
    dir.join(DISCRIMINATOR_FILE)
}

/// Write `weights` with `meta` to `path`, replacing any existing file.
pub fn save_checkpoint<P: AsRef<Path>>(
    path: P,
    weights: &[f32],
    meta: &CheckpointMeta,
) -> Result<(), CheckpointError> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    write_header(&mut writer, weights.len() as u64, meta)?;
    write_weights(&mut writer, weights, meta.compression)?;
    writer.flush()?;
    Ok(())
}

/// Read a checkpoint written by [`save_checkpoint`].
pub fn load_checkpoint<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, CheckpointMeta), CheckpointError> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    let (count, meta) = read_header(&mut reader)?;
    let count = usize::try_from(count)
        .map_err(|_| CheckpointError::InvalidData(format!("weight count {count} is too large")))?;
    let weights = read_weights(&mut reader, count, meta.compression)?;
    Ok((weights, meta))
}

fn write_header<W: Write>(writer: &mut W, count: u64, meta: &CheckpointMeta) -> Result<(), CheckpointError> {
    let mut header = Vec::with_capacity(HEADER_SIZE);
    header.write_all(MAGIC)?;
    header.write_u32::<LittleEndian>(VERSION)?;
    header.write_u64::<LittleEndian>(count)?;
    header.write_u64::<LittleEndian>(meta.epoch)?;
    header.write_u64::<LittleEndian>(meta.step)?;
    header.write_f32::<LittleEndian>(meta.learning_rate)?;
    header.write_u32::<LittleEndian>(meta.compression as u32)?;
    // Reserved
    header.resize(HEADER_SIZE, 0);
    writer.write_all(&header)?;
    Ok(())
}

fn read_header<R: Read>(reader: &mut R) -> Result<(u64, CheckpointMeta), CheckpointError> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;
    let mut cur = &header[..];

    let mut magic = [0u8; 8];
    cur.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(CheckpointError::InvalidMagic);
    }

    let version = cur.read_u32::<LittleEndian>()?;
    if version != VERSION {
        return Err(CheckpointError::UnsupportedVersion(version));
    }

    let count = cur.read_u64::<LittleEndian>()?;
    let epoch = cur.read_u64::<LittleEndian>()?;
    let step = cur.read_u64::<LittleEndian>()?;
    let learning_rate = cur.read_f32::<LittleEndian>()?;
    let compression = match cur.read_u32::<LittleEndian>()? {
        0 => Compression::None,
        #[cfg(feature = "lz4")]
        1 => Compression::Lz4,
        other => return Err(CheckpointError::UnsupportedCompression(other)),
    };

    Ok((
        count,
        CheckpointMeta {
            epoch,
            step,
            learning_rate,
            compression,
        },
    ))
}

fn write_weights<W: Write>(writer: &mut W, weights: &[f32], compression: Compression) -> Result<(), CheckpointError> {
    let mut data = Vec::with_capacity(weights.len() * 4);
    for &w in weights {
        data.write_f32::<LittleEndian>(w)?;
    }

    match compression {
        Compression::None => writer.write_all(&data)?,
        #[cfg(feature = "lz4")]
        Compression::Lz4 => {
            writer.write_u64::<LittleEndian>(data.len() as u64)?;
            writer.write_all(&lz4_flex::compress_prepend_size(&data))?;
        }
    }
    Ok(())
}

fn read_weights<R: Read>(reader: &mut R, count: usize, compression: Compression) -> Result<Vec<f32>, CheckpointError> {
    // The header count is untrusted; size the payload from the file instead.
    let byte_len = count
        .checked_mul(4)
        .ok_or_else(|| CheckpointError::InvalidData(format!("weight count {count} is too large")))?;

    let data = match compression {
        Compression::None => {
            let mut data = Vec::new();
            reader.read_to_end(&mut data)?;
            data
        }
        #[cfg(feature = "lz4")]
        Compression::Lz4 => {
            let expected = reader.read_u64::<LittleEndian>()?;
            if expected != byte_len as u64 {
                return Err(CheckpointError::InvalidData(format!(
                    "payload size {expected} does not match {count} weights"
                )));
            }
            let mut compressed = Vec::new();
            reader.read_to_end(&mut compressed)?;
            lz4_flex::decompress_size_prepended(&compressed)
                .map_err(|e| CheckpointError::InvalidData(format!("LZ4 decompression failed: {e}")))?
        }
    };

    if data.len() != byte_len {
        return Err(CheckpointError::InvalidData(format!(
            "expected {} weights, payload holds {} bytes",
            count,
            data.len()
        )));
    }

    let mut cur = &data[..];
    let mut weights = vec![0.0f32; count];
    cur.read_f32_into::<LittleEndian>(&mut weights)?;
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    /// Byte offset of the weight count (after magic and version).
    const COUNT_OFFSET: usize = 12;

    fn sample_meta() -> CheckpointMeta {
        CheckpointMeta {
            epoch: 20,
            step: 1234,
            learning_rate: 0.005,
            compression: Compression::None,
        }
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let weights: Vec<f32> = (0..37).map(|i| i as f32 * 0.25 - 3.0).collect();
        let file = NamedTempFile::new().unwrap();
        save_checkpoint(file.path(), &weights, &sample_meta()).unwrap();

        let (loaded, meta) = load_checkpoint(file.path()).unwrap();
        assert_eq!(loaded, weights);
        assert_eq!(meta, sample_meta());
    }

    #[test]
    fn test_empty_weights_roundtrip() {
        let file = NamedTempFile::new().unwrap();
        save_checkpoint(file.path(), &[], &CheckpointMeta::default()).unwrap();
        let (loaded, _) = load_checkpoint(file.path()).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_rejects_foreign_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), vec![7u8; HEADER_SIZE + 16]).unwrap();
        assert!(matches!(load_checkpoint(file.path()), Err(CheckpointError::InvalidMagic)));
    }

    #[test]
    fn test_truncated_payload_is_an_error() {
        let file = NamedTempFile::new().unwrap();
        save_checkpoint(file.path(), &[1.0, 2.0, 3.0], &sample_meta()).unwrap();
        let bytes = std::fs::read(file.path()).unwrap();
        std::fs::write(file.path(), &bytes[..bytes.len() - 4]).unwrap();
        assert!(matches!(load_checkpoint(file.path()), Err(CheckpointError::InvalidData(_))));
    }

    #[test]
    fn test_huge_weight_count_is_rejected() {
        let file = NamedTempFile::new().unwrap();
        save_checkpoint(file.path(), &[1.0, 2.0], &sample_meta()).unwrap();
        let mut bytes = std::fs::read(file.path()).unwrap();
        bytes[COUNT_OFFSET..COUNT_OFFSET + 8].copy_from_slice(&u64::MAX.to_le_bytes());
        std::fs::write(file.path(), &bytes).unwrap();
        assert!(matches!(load_checkpoint(file.path()), Err(CheckpointError::InvalidData(_))));

        bytes[COUNT_OFFSET..COUNT_OFFSET + 8].copy_from_slice(&(1u64 << 40).to_le_bytes());
        std::fs::write(file.path(), &bytes).unwrap();
        assert!(matches!(load_checkpoint(file.path()), Err(CheckpointError::InvalidData(_))));
    }

    #[cfg(feature = "lz4")]
    #[test]
    fn test_lz4_roundtrip() {
        let weights = vec![0.5f32; 4096];
        let meta = CheckpointMeta {
            compression: Compression::Lz4,
            ..sample_meta()
        };
        let file = NamedTempFile::new().unwrap();
        save_checkpoint(file.path(), &weights, &meta).unwrap();
        assert!(std::fs::metadata(file.path()).unwrap().len() < 4096 * 4);
        let (loaded, loaded_meta) = load_checkpoint(file.path()).unwrap();
        assert_eq!(loaded, weights);
        assert_eq!(loaded_meta.compression, Compression::Lz4);
    }
}
