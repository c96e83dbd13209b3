//! Learning-rate schedule.

use serde::{Deserialize, Serialize};

/// `initial · gamma^(epoch / step_size)` (integer division).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepDecay {
    pub initial: f32,
    pub step_size: u64,
    pub gamma: f32,
}

impl StepDecay {
    pub fn new(initial: f32, step_size: u64, gamma: f32) -> Self {
        Self {
            initial,
            step_size,
            gamma,
        }
    }

    pub fn rate_at(&self, epoch: u64) -> f32 {
        let drops = epoch / self.step_size.max(1);
        self.initial * self.gamma.powi(drops.min(i32::MAX as u64) as i32)
    }
}

impl Default for StepDecay {
    fn default() -> Self {
        Self::new(0.05, 1000, 0.1)
    }
}

/// Current position in a [`StepDecay`] schedule.
///
/// Advanced once per adversarial epoch; optimizers read [`rate`](Self::rate)
/// whenever they step.
#[derive(Debug, Clone)]
pub struct LearningRateCursor {
    schedule: StepDecay,
    epoch: u64,
}

impl LearningRateCursor {
    pub fn new(schedule: StepDecay) -> Self {
        Self { schedule, epoch: 0 }
    }

    pub fn rate(&self) -> f32 {
        self.schedule.rate_at(self.epoch)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn advance(&mut self) {
        self.epoch += 1;
    }
}
