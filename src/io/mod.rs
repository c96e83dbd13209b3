//! I/O: source image pools, batch loading, checkpoints and previews.
//!
//! - `.npy` image pools (memory-mapped) and in-memory pools
//! - Prefetching batch loader
//! - Binary weight checkpoints (`g.ckpt`, `d.ckpt`)
//! - PNG preview strips

pub mod checkpoint;
pub mod loader;
pub mod pool;
pub mod preview;

// Re-export public types and functions
pub use checkpoint::{
    discriminator_path, generator_path, load_checkpoint, save_checkpoint, CheckpointError,
    CheckpointMeta, Compression,
};
pub use loader::{Augmentation, Batch, BatchLoader, EpochBatches, LoaderError};
pub use pool::{write_npy, ImageSource, MemoryPool, NpyPool, PoolError};
pub use preview::{save_strip, strip};
