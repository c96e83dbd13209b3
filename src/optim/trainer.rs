//! Training orchestration.
//!
//! Two phases, run once each and in order:
//!
//! 1. **Init**: the generator alone is fitted to `hr` with a pixel MSE.
//! 2. **Adversarial**: per batch, one generator step (adversarial + content +
//!    perceptual loss) followed by one discriminator step on the same batch.
//!    The discriminator step sees the generator weights that were just updated.
//!
//! All mutable training state lives in [`TrainingSession`]. The learning rate
//! comes from a [`LearningRateCursor`] that advances once per adversarial
//! epoch; the three momentum optimizers read it at every step.

use super::loss::{discriminator_loss, generator_loss, init_loss, GeneratorLossBreakdown};
use super::momentum::Momentum;
use super::schedule::{LearningRateCursor, StepDecay};
use crate::diff::GradientEngine;
use crate::io::checkpoint::{
    discriminator_path, generator_path, save_checkpoint, CheckpointMeta, Compression,
};
use crate::io::loader::{Batch, BatchLoader};
use crate::io::preview::save_strip;
use crate::metrics::psnr;
use crate::nets::{Discriminator, FeatureExtractor, Generator};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Hyper-parameters and paths for a training run.
///
/// Every field has a default, so a JSON config only needs the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub batch_size: usize,
    /// Epochs of generator-only pretraining.
    pub n_epoch_init: u64,
    /// Epochs of adversarial training.
    pub n_epoch: u64,
    pub lr_init: f32,
    /// Learning rate decays by `lr_gamma` every `lr_decay_epochs` adversarial epochs.
    pub lr_decay_epochs: u64,
    pub lr_gamma: f32,
    pub momentum: f32,
    /// Init-phase progress is logged on steps that are multiples of this.
    pub init_log_interval: u64,
    /// Checkpoint after epoch `e` when `e != 0 && e % checkpoint_interval == 0`.
    pub checkpoint_interval: u64,
    pub checkpoint_compression: Compression,
    pub checkpoint_dir: PathBuf,
    pub save_dir: PathBuf,
    pub train_pool: PathBuf,
    pub valid_pool: PathBuf,
    pub seed: u64,
    /// Held-out image used by evaluation.
    pub eval_image_index: usize,
    /// Images per preview strip written alongside checkpoints.
    pub preview_count: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            n_epoch_init: 10,
            n_epoch: 2000,
            lr_init: 0.05,
            lr_decay_epochs: 1000,
            lr_gamma: 0.1,
            momentum: 0.9,
            init_log_interval: 64,
            checkpoint_interval: 10,
            checkpoint_compression: Compression::None,
            checkpoint_dir: PathBuf::from("models"),
            save_dir: PathBuf::from("samples"),
            train_pool: PathBuf::from("data/train.npy"),
            valid_pool: PathBuf::from("data/valid.npy"),
            seed: 0,
            eval_image_index: 0,
            preview_count: 4,
        }
    }
}

impl TrainConfig {
    /// Load from a JSON file; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn schedule(&self) -> StepDecay {
        StepDecay::new(self.lr_init, self.lr_decay_epochs, self.lr_gamma)
    }

    pub fn checkpoint_due(&self, epoch: u64) -> bool {
        epoch != 0 && self.checkpoint_interval != 0 && epoch % self.checkpoint_interval == 0
    }

    /// Create the checkpoint and sample directories.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.checkpoint_dir, &self.save_dir] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Adversarial,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Init => write!(f, "init"),
            Phase::Adversarial => write!(f, "adversarial"),
        }
    }
}

/// Weights and counters mutated by training.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingState {
    pub generator_weights: Vec<f32>,
    pub discriminator_weights: Vec<f32>,
    /// Epochs completed across both phases.
    pub epoch: u64,
    /// Optimizer steps taken across both phases (a G+D pair counts once).
    pub step: u64,
}

/// Summary of a [`TrainingSession::train`] run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainReport {
    pub init_steps: u64,
    pub adversarial_steps: u64,
    /// `(phase, epoch)` of every checkpoint written.
    pub checkpoints: Vec<(Phase, u64)>,
    pub last_init_loss: Option<f32>,
    pub last_generator_loss: Option<GeneratorLossBreakdown>,
    pub last_discriminator_loss: Option<f32>,
}

pub struct TrainingSession<G, D, F, E> {
    config: TrainConfig,
    generator: G,
    discriminator: D,
    features: F,
    engine: E,
    state: TrainingState,
    cursor: LearningRateCursor,
    g_init_opt: Momentum,
    g_opt: Momentum,
    d_opt: Momentum,
}

impl<G, D, F, E> TrainingSession<G, D, F, E>
where
    G: Generator,
    D: Discriminator,
    F: FeatureExtractor,
    E: GradientEngine,
{
    pub fn new(config: TrainConfig, generator: G, discriminator: D, features: F, engine: E) -> Self {
        let state = TrainingState {
            generator_weights: generator.initial_weights(),
            discriminator_weights: discriminator.initial_weights(),
            epoch: 0,
            step: 0,
        };
        let cursor = LearningRateCursor::new(config.schedule());
        let momentum = config.momentum;
        Self {
            config,
            generator,
            discriminator,
            features,
            engine,
            state,
            cursor,
            g_init_opt: Momentum::new(momentum),
            g_opt: Momentum::new(momentum),
            d_opt: Momentum::new(momentum),
        }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn state(&self) -> &TrainingState {
        &self.state
    }

    /// One pretraining step on the generator. Returns the pre-step MSE.
    pub fn init_step(&mut self, batch: &Batch) -> f32 {
        let generator = &self.generator;
        let objective = |w: &[f32]| init_loss(&generator.upscale(w, &batch.lr), &batch.hr);
        let (loss, grad) = self
            .engine
            .value_and_grad(&self.state.generator_weights, &objective);
        self.g_init_opt
            .step(&mut self.state.generator_weights, &grad, &self.cursor);
        self.state.step += 1;
        loss
    }

    /// One adversarial generator step. Returns the pre-step loss terms.
    pub fn generator_step(&mut self, batch: &Batch) -> GeneratorLossBreakdown {
        let generator = &self.generator;
        let discriminator = &self.discriminator;
        let features: &dyn FeatureExtractor = &self.features;
        let d_weights = &self.state.discriminator_weights;

        let breakdown = |w: &[f32]| {
            let fake = generator.upscale(w, &batch.lr);
            let logits = discriminator.logits(d_weights, &fake);
            generator_loss(&logits, &fake, &batch.hr, features)
        };
        let terms = breakdown(&self.state.generator_weights);
        let objective = |w: &[f32]| breakdown(w).total();
        let (_, grad) = self
            .engine
            .value_and_grad(&self.state.generator_weights, &objective);
        self.g_opt
            .step(&mut self.state.generator_weights, &grad, &self.cursor);
        terms
    }

    /// One discriminator step against the current generator output.
    pub fn discriminator_step(&mut self, batch: &Batch) -> f32 {
        let fake = self
            .generator
            .upscale(&self.state.generator_weights, &batch.lr);
        let discriminator = &self.discriminator;
        let objective = |w: &[f32]| {
            discriminator_loss(&discriminator.logits(w, &batch.hr), &discriminator.logits(w, &fake))
        };
        let (loss, grad) = self
            .engine
            .value_and_grad(&self.state.discriminator_weights, &objective);
        self.d_opt
            .step(&mut self.state.discriminator_weights, &grad, &self.cursor);
        loss
    }

    /// One generator step followed by one discriminator step on the same batch.
    /// The discriminator sees the generator weights the first step produced.
    pub fn adversarial_step(&mut self, batch: &Batch) -> (GeneratorLossBreakdown, f32) {
        let g_loss = self.generator_step(batch);
        let d_loss = self.discriminator_step(batch);
        self.state.step += 1;
        (g_loss, d_loss)
    }

    /// PSNR of `G(lr)` against `hr` at the current weights.
    pub fn batch_psnr(&self, batch: &Batch) -> f64 {
        let generated = self
            .generator
            .upscale(&self.state.generator_weights, &batch.lr);
        psnr(&generated, &batch.hr)
    }

    /// Run the init phase and then the adversarial phase.
    pub fn train(&mut self, loader: &BatchLoader) -> Result<TrainReport> {
        let mut report = TrainReport::default();
        info!(
            pool = loader.pool_len(),
            batch_size = loader.batch_size(),
            n_epoch_init = self.config.n_epoch_init,
            n_epoch = self.config.n_epoch,
            "initialize learning"
        );
        self.run_init_phase(loader, &mut report)?;
        info!("adversarial learning");
        self.run_adversarial_phase(loader, &mut report)?;
        Ok(report)
    }

    fn run_init_phase(&mut self, loader: &BatchLoader, report: &mut TrainReport) -> Result<()> {
        let n_step_epoch = loader.batches_per_epoch();
        let interval = self.config.init_log_interval.max(1);

        for epoch in 0..self.config.n_epoch_init {
            let mut last_batch = None;
            for (step, batch) in loader.epoch(self.state.epoch).enumerate() {
                let batch = batch.with_context(|| format!("Failed to prepare init batch {step}"))?;
                let step_time = Instant::now();
                let loss = self.init_step(&batch);
                report.init_steps += 1;
                report.last_init_loss = Some(loss);

                if step as u64 % interval == 0 {
                    let psnr = self.batch_psnr(&batch);
                    info!(
                        epoch,
                        n_epoch_init = self.config.n_epoch_init,
                        step,
                        n_step_epoch,
                        time = step_time.elapsed().as_secs_f32(),
                        mse = loss,
                        psnr,
                        "init step"
                    );
                }
                last_batch = Some(batch);
            }
            self.state.epoch += 1;

            if self.config.checkpoint_due(epoch) {
                self.write_checkpoint(Phase::Init, epoch, last_batch.as_ref())?;
                report.checkpoints.push((Phase::Init, epoch));
            }
        }
        Ok(())
    }

    fn run_adversarial_phase(&mut self, loader: &BatchLoader, report: &mut TrainReport) -> Result<()> {
        let n_step_epoch = loader.batches_per_epoch();

        for epoch in 0..self.config.n_epoch {
            let mut last_batch = None;
            for (step, batch) in loader.epoch(self.state.epoch).enumerate() {
                let batch =
                    batch.with_context(|| format!("Failed to prepare adversarial batch {step}"))?;
                let step_time = Instant::now();
                let (g_loss, d_loss) = self.adversarial_step(&batch);
                report.adversarial_steps += 1;
                report.last_generator_loss = Some(g_loss);
                report.last_discriminator_loss = Some(d_loss);

                info!(
                    epoch,
                    n_epoch = self.config.n_epoch,
                    step,
                    n_step_epoch,
                    time = step_time.elapsed().as_secs_f32(),
                    g_loss = g_loss.total(),
                    d_loss,
                    "adversarial step"
                );
                debug!(
                    adversarial = g_loss.adversarial,
                    content = g_loss.content,
                    perceptual = g_loss.perceptual,
                    "generator loss terms"
                );
                last_batch = Some(batch);
            }
            self.state.epoch += 1;

            self.cursor.advance();
            debug!(lr = self.cursor.rate(), "learning rate");

            if self.config.checkpoint_due(epoch) {
                self.write_checkpoint(Phase::Adversarial, epoch, last_batch.as_ref())?;
                report.checkpoints.push((Phase::Adversarial, epoch));
            }
        }
        Ok(())
    }

    /// Write `g.ckpt`, `d.ckpt` and a preview strip of `G(lr)` for `batch`.
    fn write_checkpoint(&self, phase: Phase, epoch: u64, batch: Option<&Batch>) -> Result<()> {
        let dir = &self.config.checkpoint_dir;
        let meta = CheckpointMeta {
            epoch,
            step: self.state.step,
            learning_rate: self.cursor.rate(),
            compression: self.config.checkpoint_compression,
        };
        let g_path = generator_path(dir);
        save_checkpoint(&g_path, &self.state.generator_weights, &meta)
            .with_context(|| format!("Failed to save {}", g_path.display()))?;
        let d_path = discriminator_path(dir);
        save_checkpoint(&d_path, &self.state.discriminator_weights, &meta)
            .with_context(|| format!("Failed to save {}", d_path.display()))?;

        if let Some(batch) = batch {
            let generated = self
                .generator
                .upscale(&self.state.generator_weights, &batch.lr);
            let name = match phase {
                Phase::Init => format!("train_init_{epoch}.png"),
                Phase::Adversarial => format!("train_{epoch}.png"),
            };
            save_strip(
                &generated,
                self.config.preview_count,
                (-1.0, 1.0),
                &self.config.save_dir.join(name),
            )?;
        }

        info!(%phase, epoch, dir = %dir.display(), "checkpoint saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Image, ImageBatch};
    use crate::diff::CentralDifference;
    use crate::nets::{AffineUpscaler, LumaPyramid, StatisticsCritic};
    use nalgebra::Vector3;

    fn session(config: TrainConfig) -> TrainingSession<AffineUpscaler, StatisticsCritic, LumaPyramid, CentralDifference> {
        TrainingSession::new(
            config,
            AffineUpscaler,
            StatisticsCritic,
            LumaPyramid::default(),
            CentralDifference::default(),
        )
    }

    fn flat_batch(value: f32) -> Batch {
        Batch {
            lr: ImageBatch::single(Image::filled(4, 4, Vector3::new(value, value, value))),
            hr: ImageBatch::single(Image::filled(16, 16, Vector3::new(value, value, value))),
        }
    }

    #[test]
    fn test_config_defaults() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.batch_size, 32);
        assert_eq!(cfg.n_epoch_init, 10);
        assert_eq!(cfg.n_epoch, 2000);
        assert_eq!(cfg.checkpoint_dir, PathBuf::from("models"));
        assert_eq!(cfg.save_dir, PathBuf::from("samples"));
    }

    #[test]
    fn test_partial_json_config() {
        let cfg: TrainConfig = serde_json::from_str(r#"{"batch_size": 4, "n_epoch": 3}"#).unwrap();
        assert_eq!(cfg.batch_size, 4);
        assert_eq!(cfg.n_epoch, 3);
        assert_eq!(cfg.n_epoch_init, 10);
        assert_eq!(cfg.lr_init, 0.05);
    }

    #[test]
    fn test_checkpoint_cadence() {
        let cfg = TrainConfig::default();
        let due: Vec<u64> = (0..25).filter(|&e| cfg.checkpoint_due(e)).collect();
        assert_eq!(due, vec![10, 20]);
    }

    #[test]
    fn test_init_step_reduces_mse() {
        let mut s = session(TrainConfig::default());
        let batch = flat_batch(0.8);
        let first = s.init_step(&batch);
        let mut last = first;
        for _ in 0..20 {
            last = s.init_step(&batch);
        }
        assert!(last < first, "mse did not drop: {first} -> {last}");
        assert_eq!(s.state().step, 21);
    }

    #[test]
    fn test_discriminator_step_uses_only_discriminator_weights() {
        let mut s = session(TrainConfig::default());
        let g_before = s.state().generator_weights.clone();
        let batch = flat_batch(0.6);
        let first = s.discriminator_step(&batch);
        assert_eq!(s.state().generator_weights, g_before);
        assert_ne!(s.state().discriminator_weights, vec![0.0; StatisticsCritic::NUM_WEIGHTS]);
        // Zero weights give logit 0 for both: 2·ln 2.
        assert!((first - 2.0 * std::f32::consts::LN_2).abs() < 1e-5);
    }

    #[test]
    fn test_generator_step_reports_terms() {
        let mut s = session(TrainConfig::default());
        let g_before = s.state().generator_weights.clone();
        let terms = s.generator_step(&flat_batch(0.5));
        assert!(terms.total() > 0.0);
        assert!((terms.adversarial - 1e-3 * std::f32::consts::LN_2).abs() < 1e-6);
        assert_ne!(s.state().generator_weights, g_before);
    }

    #[test]
    fn test_adversarial_step_scores_updated_generator() {
        let mut s = session(TrainConfig::default());
        let batch = flat_batch(0.6);
        // Move the critic off zero so its logits depend on the generated images.
        s.discriminator_step(&batch);

        let g_before = s.state().generator_weights.clone();
        let d_before = s.state().discriminator_weights.clone();
        let step_before = s.state().step;
        let (_, d_loss) = s.adversarial_step(&batch);
        let g_after = s.state().generator_weights.clone();
        assert_ne!(g_after, g_before);
        assert_eq!(s.state().step, step_before + 1);

        let score = |g_weights: &[f32]| {
            let fake = s.generator.upscale(g_weights, &batch.lr);
            discriminator_loss(
                &s.discriminator.logits(&d_before, &batch.hr),
                &s.discriminator.logits(&d_before, &fake),
            )
        };
        assert_eq!(d_loss, score(&g_after));
        assert!((d_loss - score(&g_before)).abs() > 1e-7);
    }
}
