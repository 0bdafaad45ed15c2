pub mod logistic;
pub mod mlp;
pub mod svc;

pub use logistic::{LogisticParams, LogisticRegression};
pub use mlp::{MlpClassifier, MlpParams};
pub use svc::{Kernel, Svc, SvcParams};

use propensity_core::{Matrix, Result};

/// A binary classifier over `Matrix` features and 0/1 labels.
pub trait Classifier {
    fn fit(&mut self, x: &Matrix, y: &[f64]) -> Result<()>;
    /// Predicted 0/1 labels.
    fn predict(&self, x: &Matrix) -> Result<Vec<f64>>;
}

/// Classifiers that expose a positive-class probability.
pub trait ProbabilisticClassifier: Classifier {
    /// P(y = 1) per row.
    fn predict_proba(&self, x: &Matrix) -> Result<Vec<f64>>;

    /// ln P(y = 1) per row, clamped away from -inf.
    fn predict_log_proba(&self, x: &Matrix) -> Result<Vec<f64>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| p.max(1e-15).ln())
            .collect())
    }
}
