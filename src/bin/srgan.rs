//! srgan: train the super-resolution GAN or evaluate a saved generator.
//!
//! Usage:
//!   srgan --mode train --train-pool data/train.npy
//!   srgan --mode eval --valid-pool data/valid.npy

use anyhow::{Context, Result};
use clap::Parser;
use srgan_rs::diff::CentralDifference;
use srgan_rs::io::{BatchLoader, ImageSource, NpyPool};
use srgan_rs::nets::{AffineUpscaler, LumaPyramid, StatisticsCritic};
use srgan_rs::optim::{evaluate, TrainConfig, TrainingSession};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Train,
    Eval,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Train => write!(f, "train"),
            Mode::Eval => write!(f, "eval"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Mode::Train),
            "eval" => Ok(Mode::Eval),
            _ => Err(format!("Unknown --mode '{}'. Available: train, eval", s)),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "srgan", version, about = "Train or evaluate an SRGAN generator")]
struct Args {
    /// train or eval
    #[arg(long, default_value = "train")]
    mode: Mode,

    /// JSON file with training settings (missing fields use defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// (N, H, W, 3) uint8 .npy pool of training images
    #[arg(long)]
    train_pool: Option<PathBuf>,

    /// (N, H, W, 3) uint8 .npy pool of held-out images
    #[arg(long)]
    valid_pool: Option<PathBuf>,

    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,

    /// Directory for preview strips and evaluation output
    #[arg(long)]
    save_dir: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    n_epoch_init: Option<u64>,

    #[arg(long)]
    n_epoch: Option<u64>,

    #[arg(long)]
    batch_size: Option<usize>,

    /// Held-out image to evaluate
    #[arg(long)]
    image_index: Option<usize>,
}

impl Args {
    fn into_config(self) -> Result<(Mode, TrainConfig)> {
        let mut cfg = match &self.config {
            Some(path) => TrainConfig::from_json_file(path)?,
            None => TrainConfig::default(),
        };
        if let Some(v) = self.train_pool {
            cfg.train_pool = v;
        }
        if let Some(v) = self.valid_pool {
            cfg.valid_pool = v;
        }
        if let Some(v) = self.checkpoint_dir {
            cfg.checkpoint_dir = v;
        }
        if let Some(v) = self.save_dir {
            cfg.save_dir = v;
        }
        if let Some(v) = self.seed {
            cfg.seed = v;
        }
        if let Some(v) = self.n_epoch_init {
            cfg.n_epoch_init = v;
        }
        if let Some(v) = self.n_epoch {
            cfg.n_epoch = v;
        }
        if let Some(v) = self.batch_size {
            anyhow::ensure!(v > 0, "--batch-size must be positive");
            cfg.batch_size = v;
        }
        if let Some(v) = self.image_index {
            cfg.eval_image_index = v;
        }
        Ok((self.mode, cfg))
    }
}

fn train(cfg: TrainConfig) -> Result<()> {
    let pool = NpyPool::open(&cfg.train_pool)
        .with_context(|| format!("Failed to open training pool {}", cfg.train_pool.display()))?;
    info!(path = %cfg.train_pool.display(), images = pool.len(), "training pool");
    let loader = BatchLoader::training(Arc::new(pool), cfg.batch_size, cfg.seed);

    let mut session = TrainingSession::new(
        cfg,
        AffineUpscaler,
        StatisticsCritic,
        LumaPyramid::default(),
        CentralDifference::default(),
    );
    let report = session.train(&loader)?;
    info!(
        init_steps = report.init_steps,
        adversarial_steps = report.adversarial_steps,
        checkpoints = report.checkpoints.len(),
        "training finished"
    );
    Ok(())
}

fn eval(cfg: TrainConfig) -> Result<()> {
    let pool = NpyPool::open(&cfg.valid_pool)
        .with_context(|| format!("Failed to open validation pool {}", cfg.valid_pool.display()))?;
    let out = evaluate(
        &AffineUpscaler,
        &pool,
        cfg.eval_image_index,
        &cfg.checkpoint_dir,
        &cfg.save_dir,
    )?;
    info!(path = %out.generated_path.display(), "wrote generated image");
    Ok(())
}

fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let (mode, cfg) = Args::parse().into_config()?;
    info!(version = srgan_rs::VERSION, %mode, "srgan");
    cfg.ensure_dirs()?;

    match mode {
        Mode::Train => train(cfg),
        Mode::Eval => eval(cfg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!("train".parse::<Mode>().unwrap(), Mode::Train);
        assert_eq!("eval".parse::<Mode>().unwrap(), Mode::Eval);
        assert!("serve".parse::<Mode>().is_err());
    }

    #[test]
    fn test_unknown_mode_is_a_parse_error() {
        assert!(Args::try_parse_from(["srgan", "--mode", "predict"]).is_err());
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::try_parse_from(["srgan", "--mode", "eval", "--batch-size", "8", "--n-epoch", "3"]).unwrap();
        let (mode, cfg) = args.into_config().unwrap();
        assert_eq!(mode, Mode::Eval);
        assert_eq!(cfg.batch_size, 8);
        assert_eq!(cfg.n_epoch, 3);
        assert_eq!(cfg.n_epoch_init, 10);
    }
}
