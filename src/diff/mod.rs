//! Gradient computation for flat weight vectors.
//!
//! The orchestrator only needs `value_and_grad`: the objective value at the
//! current weights and the gradient of that objective with respect to every
//! weight. `CentralDifference` provides it numerically, evaluating the
//! coordinates in parallel with rayon. It is exact enough for the small
//! reference networks and is also what the tests use as a gradient oracle.

use rayon::prelude::*;

/// Objective closure evaluated by a gradient engine.
pub type Objective<'a> = dyn Fn(&[f32]) -> f32 + Sync + 'a;

pub trait GradientEngine: Send + Sync {
    /// Returns `(objective(weights), ∇objective(weights))`.
    fn value_and_grad(&self, weights: &[f32], objective: &Objective<'_>) -> (f32, Vec<f32>);
}

/// Central finite differences: `(f(w + εe_i) - f(w - εe_i)) / 2ε`.
#[derive(Debug, Clone, Copy)]
pub struct CentralDifference {
    pub eps: f32,
}

impl Default for CentralDifference {
    fn default() -> Self {
        Self { eps: 1e-3 }
    }
}

impl GradientEngine for CentralDifference {
    fn value_and_grad(&self, weights: &[f32], objective: &Objective<'_>) -> (f32, Vec<f32>) {
        let value = objective(weights);
        let eps = self.eps;
        let grad = (0..weights.len())
            .into_par_iter()
            .map(|i| {
                let mut probe = weights.to_vec();
                probe[i] = weights[i] + eps;
                let plus = objective(&probe);
                probe[i] = weights[i] - eps;
                let minus = objective(&probe);
                (plus - minus) / (2.0 * eps)
            })
            .collect();
        (value, grad)
    }
}
