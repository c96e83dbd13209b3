//! Optimization components (losses, optimizer, schedule, training, evaluation).
//!
//! This module contains everything needed for training:
//! - Momentum optimizer and step-decay learning rate
//! - Loss functions (MSE, sigmoid cross entropy, SRGAN generator loss)
//! - Two-phase training orchestration
//! - Evaluation on a held-out image

pub mod evaluate;
pub mod loss;
pub mod momentum;
pub mod schedule;
pub mod trainer;

pub use evaluate::{evaluate, EvalOutputs};
pub use loss::GeneratorLossBreakdown;
pub use momentum::Momentum;
pub use schedule::{LearningRateCursor, StepDecay};
pub use trainer::{Phase, TrainConfig, TrainReport, TrainingSession, TrainingState};
