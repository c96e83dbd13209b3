//! Heavy-ball momentum optimizer.
//!
//! `v ← μ·v + g`, `w ← w − lr·v`. The learning rate is not stored here; every
//! step reads it from the shared [`LearningRateCursor`] so all optimizers of a
//! session follow the same schedule.

use super::schedule::LearningRateCursor;

pub struct Momentum {
    pub momentum: f32,
    velocity: Vec<f32>,
    steps: u64,
}

impl Momentum {
    pub fn new(momentum: f32) -> Self {
        Self {
            momentum,
            velocity: Vec::new(),
            steps: 0,
        }
    }

    pub fn ensure_len(&mut self, len: usize) {
        if self.velocity.len() != len {
            self.velocity.resize(len, 0.0);
        }
    }

    pub fn velocity(&self) -> &[f32] {
        &self.velocity
    }

    /// Number of updates applied so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn step(&mut self, params: &mut [f32], grads: &[f32], cursor: &LearningRateCursor) {
        assert_eq!(params.len(), grads.len());
        self.ensure_len(params.len());
        self.steps += 1;

        let lr = cursor.rate();
        let mu = self.momentum;
        for ((w, v), &g) in params.iter_mut().zip(self.velocity.iter_mut()).zip(grads) {
            *v = mu * *v + g;
            *w -= lr * *v;
        }
    }
}
