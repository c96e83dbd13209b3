//! End-to-end training runs on tiny pools: step counts and checkpoint cadence.

use image::RgbImage;
use srgan_rs::diff::CentralDifference;
use srgan_rs::io::{load_checkpoint, write_npy, BatchLoader, MemoryPool, NpyPool};
use srgan_rs::nets::{AffineUpscaler, LumaPyramid, StatisticsCritic};
use srgan_rs::optim::{evaluate, Phase, TrainConfig, TrainingSession};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn tiles(n: usize, size: u32) -> Vec<RgbImage> {
    (0..n)
        .map(|i| {
            RgbImage::from_fn(size, size, |x, y| {
                image::Rgb([(x * 15) as u8, (y * 15) as u8, (60 + i * 40) as u8])
            })
        })
        .collect()
}

fn config(dir: &Path, batch_size: usize, n_epoch_init: u64, n_epoch: u64) -> TrainConfig {
    let cfg = TrainConfig {
        batch_size,
        n_epoch_init,
        n_epoch,
        checkpoint_dir: dir.join("models"),
        save_dir: dir.join("samples"),
        train_pool: dir.join("train.npy"),
        ..TrainConfig::default()
    };
    cfg.ensure_dirs().unwrap();
    cfg
}

fn run(cfg: TrainConfig, images: &[RgbImage]) -> (srgan_rs::optim::TrainReport, TrainConfig) {
    write_npy(&cfg.train_pool, images).unwrap();
    let pool = NpyPool::open(&cfg.train_pool).unwrap();
    let loader = BatchLoader::training(Arc::new(pool), cfg.batch_size, cfg.seed);
    let mut session = TrainingSession::new(
        cfg.clone(),
        AffineUpscaler,
        StatisticsCritic,
        LumaPyramid::default(),
        CentralDifference::default(),
    );
    let report = session.train(&loader).unwrap();
    assert_eq!(session.state().step, report.init_steps + report.adversarial_steps);
    (report, cfg)
}

#[test]
fn test_single_init_epoch_takes_one_step_and_no_checkpoint() {
    let dir = TempDir::new().unwrap();
    let (report, cfg) = run(config(dir.path(), 2, 1, 0), &tiles(2, 16));

    assert_eq!(report.init_steps, 1);
    assert_eq!(report.adversarial_steps, 0);
    assert!(report.checkpoints.is_empty());
    assert!(!cfg.checkpoint_dir.join("g.ckpt").exists());
    assert!(report.last_init_loss.is_some());
}

#[test]
fn test_partial_final_batch_is_trained_on() {
    let dir = TempDir::new().unwrap();
    let (report, _) = run(config(dir.path(), 2, 2, 0), &tiles(3, 16));
    assert_eq!(report.init_steps, 4);
}

#[test]
fn test_checkpoints_after_epochs_ten_and_twenty() {
    let dir = TempDir::new().unwrap();
    let (report, cfg) = run(config(dir.path(), 1, 0, 25), &tiles(1, 16));

    assert_eq!(report.adversarial_steps, 25);
    assert_eq!(
        report.checkpoints,
        vec![(Phase::Adversarial, 10), (Phase::Adversarial, 20)]
    );

    let (g, meta) = load_checkpoint(cfg.checkpoint_dir.join("g.ckpt")).unwrap();
    assert_eq!(g.len(), AffineUpscaler::NUM_WEIGHTS);
    assert_eq!(meta.epoch, 20);
    // The schedule advanced 21 times by the second checkpoint, still before the first decay.
    assert!((meta.learning_rate - 0.05).abs() < 1e-9);
    let (d, _) = load_checkpoint(cfg.checkpoint_dir.join("d.ckpt")).unwrap();
    assert_eq!(d.len(), StatisticsCritic::NUM_WEIGHTS);

    assert!(cfg.save_dir.join("train_10.png").exists());
    assert!(cfg.save_dir.join("train_20.png").exists());
    assert!(!cfg.save_dir.join("train_0.png").exists());
}

#[test]
fn test_evaluate_writes_generated_image() {
    let dir = TempDir::new().unwrap();
    let (_, cfg) = run(config(dir.path(), 1, 11, 0), &tiles(1, 16));
    assert!(cfg.checkpoint_dir.join("g.ckpt").exists());
    assert!(cfg.save_dir.join("train_init_10.png").exists());

    let valid = dir.path().join("valid.npy");
    write_npy(&valid, &tiles(2, 32)).unwrap();
    let pool = NpyPool::open(&valid).unwrap();
    let out = evaluate(&AffineUpscaler, &pool, 0, &cfg.checkpoint_dir, &cfg.save_dir).unwrap();

    assert_eq!(out.lr_size, (8, 8));
    assert_eq!(out.generated_size, (32, 32));
    let written = image::open(&out.generated_path).unwrap();
    assert_eq!((written.width(), written.height()), (32, 32));
    assert!(cfg.save_dir.join("valid_hr.png").exists());
}

#[test]
fn test_evaluate_without_checkpoint_fails() {
    let dir = TempDir::new().unwrap();
    let valid = dir.path().join("valid.npy");
    write_npy(&valid, &tiles(1, 16)).unwrap();
    let pool = NpyPool::open(&valid).unwrap();
    let err = evaluate(&AffineUpscaler, &pool, 0, dir.path(), dir.path());
    assert!(err.is_err());
}

#[test]
fn test_failed_batch_aborts_training() {
    let dir = TempDir::new().unwrap();
    let cfg = config(dir.path(), 8, 1, 0);
    // Quarter turns of non-square images cannot share one batch.
    let images = (0..64)
        .map(|i| RgbImage::from_fn(32, 16, |x, y| image::Rgb([(x * 7) as u8, (y * 15) as u8, i as u8])))
        .collect();
    let loader = BatchLoader::training(Arc::new(MemoryPool::new(images)), cfg.batch_size, cfg.seed);
    let mut session = TrainingSession::new(
        cfg,
        AffineUpscaler,
        StatisticsCritic,
        LumaPyramid::default(),
        CentralDifference::default(),
    );
    assert!(session.train(&loader).is_err());
}
