//! Batched, prefetched sample preparation.
//!
//! Each epoch walks the pool in order, in chunks of `batch_size` (the last
//! chunk may be shorter). Samples in a chunk are augmented in parallel with
//! rayon; one chunk is prepared ahead on a background thread and handed over
//! through a bounded crossbeam channel.

use super::pool::{ImageSource, PoolError};
use crate::augment::{augment_valid, Pipeline, SamplePair};
use crate::core::ImageBatch;
use crate::degrade::DegradeError;
use crate::random::SeededSource;
use crossbeam::channel::{bounded, never, Receiver};
use rayon::prelude::*;
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Degrade(#[from] DegradeError),

    #[error("batch preparation panicked: {0}")]
    Panicked(String),
}

/// A training batch: `lr` and `hr` hold the same number of images.
#[derive(Debug, Clone)]
pub struct Batch {
    pub lr: ImageBatch,
    pub hr: ImageBatch,
}

impl Batch {
    pub fn from_pairs(pairs: Vec<SamplePair>) -> Self {
        let (lr, hr): (Vec<_>, Vec<_>) = pairs.into_iter().map(|p| (p.lr, p.hr)).unzip();
        Self {
            lr: ImageBatch::new(lr),
            hr: ImageBatch::new(hr),
        }
    }

    pub fn len(&self) -> usize {
        self.lr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lr.is_empty()
    }
}

/// How samples are turned into pairs.
#[derive(Debug, Clone)]
pub enum Augmentation {
    /// Randomized training pipeline.
    Train(Pipeline),
    /// Deterministic validation pairs.
    Valid,
}

#[derive(Clone)]
pub struct BatchLoader {
    source: Arc<dyn ImageSource>,
    batch_size: usize,
    seed: u64,
    augmentation: Augmentation,
}

impl BatchLoader {
    pub fn new(source: Arc<dyn ImageSource>, batch_size: usize, seed: u64, augmentation: Augmentation) -> Self {
        assert!(batch_size > 0, "batch size must be positive");
        Self {
            source,
            batch_size,
            seed,
            augmentation,
        }
    }

    pub fn training(source: Arc<dyn ImageSource>, batch_size: usize, seed: u64) -> Self {
        Self::new(source, batch_size, seed, Augmentation::Train(Pipeline::training()))
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn pool_len(&self) -> usize {
        self.source.len()
    }

    /// Batches per epoch, counting a trailing partial batch.
    pub fn batches_per_epoch(&self) -> usize {
        self.source.len().div_ceil(self.batch_size)
    }

    /// Prepare one sample.
    pub fn sample(&self, epoch: u64, index: usize) -> Result<SamplePair, LoaderError> {
        let src = self.source.get(index)?;
        match &self.augmentation {
            Augmentation::Train(pipeline) => {
                let mut rng = SeededSource::for_sample(self.seed, epoch, index as u64);
                Ok(pipeline.run(&src, &mut rng)?)
            }
            Augmentation::Valid => Ok(augment_valid(&src)),
        }
    }

    /// Prepare the batch starting at pool index `start`.
    pub fn batch(&self, epoch: u64, start: usize) -> Result<Batch, LoaderError> {
        let end = (start + self.batch_size).min(self.source.len());
        let pairs = (start..end)
            .into_par_iter()
            .map(|i| self.sample(epoch, i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Batch::from_pairs(pairs))
    }

    /// Iterate one epoch's batches, prefetching one batch ahead.
    pub fn epoch(&self, epoch: u64) -> EpochBatches {
        let (tx, rx) = bounded(1);
        let loader = self.clone();
        let handle = std::thread::spawn(move || {
            for start in (0..loader.source.len()).step_by(loader.batch_size) {
                let batch = loader.batch(epoch, start);
                let failed = batch.is_err();
                if tx.send(batch).is_err() || failed {
                    break;
                }
            }
            debug!(epoch, "loader finished");
        });
        EpochBatches {
            rx,
            handle: Some(handle),
        }
    }
}

/// Prefetching iterator over one epoch.
pub struct EpochBatches {
    rx: Receiver<Result<Batch, LoaderError>>,
    handle: Option<JoinHandle<()>>,
}

impl Iterator for EpochBatches {
    type Item = Result<Batch, LoaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Ok(batch) = self.rx.recv() {
            return Some(batch);
        }
        // The producer hung up: either the epoch is done or it panicked.
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(()) => None,
            Err(payload) => Some(Err(LoaderError::Panicked(panic_message(payload.as_ref())))),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Drop for EpochBatches {
    fn drop(&mut self) {
        // Disconnect so a producer blocked on `send` returns, then reap it.
        drop(std::mem::replace(&mut self.rx, never()));
        if let Some(handle) = self.handle.take() {
            if let Err(payload) = handle.join() {
                warn!(reason = %panic_message(payload.as_ref()), "loader thread panicked");
            }
        }
    }
}
