use crate::{Classifier, ProbabilisticClassifier};
use propensity_core::{Matrix, PipelineError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Hyperparameters for [`LogisticRegression`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticParams {
    /// Inverse regularization strength, as in the C of an L2-penalized
    /// objective. Smaller is stronger.
    pub c: f64,
    pub learning_rate: f64,
    pub max_iter: usize,
    pub tol: f64,
    /// Reweight samples by `n / (2 * n_class)` so both classes pull equally.
    pub balanced: bool,
}

impl Default for LogisticParams {
    fn default() -> Self {
        LogisticParams {
            c: 1e-5,
            learning_rate: 0.1,
            max_iter: 1000,
            tol: 1e-6,
            balanced: true,
        }
    }
}

/// Binary logistic regression trained by batch gradient descent on the
/// L2-regularized, optionally class-weighted cross-entropy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub params: LogisticParams,
    weights: Option<Vec<f64>>,
    bias: f64,
}

impl LogisticRegression {
    pub fn new(params: LogisticParams) -> Self {
        LogisticRegression {
            params,
            weights: None,
            bias: 0.0,
        }
    }

    fn sigmoid(z: f64) -> f64 {
        1.0 / (1.0 + (-z).exp())
    }

    fn scores(&self, x: &Matrix) -> Result<Vec<f64>> {
        let w = self
            .weights
            .as_ref()
            .ok_or(PipelineError::NotFitted("LogisticRegression"))?;
        if x.cols() != w.len() {
            return Err(PipelineError::DimensionMismatch(format!(
                "model fitted on {} features, got {}",
                w.len(),
                x.cols()
            )));
        }
        Ok((0..x.rows())
            .map(|i| {
                let z: f64 = x.row(i).iter().zip(w).map(|(&xi, &wi)| xi * wi).sum();
                z + self.bias
            })
            .collect())
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(LogisticParams::default())
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &Matrix, y: &[f64]) -> Result<()> {
        let (n, p) = x.shape();
        if n == 0 {
            return Err(PipelineError::EmptyData);
        }
        if n != y.len() {
            return Err(PipelineError::DimensionMismatch(format!(
                "feature rows ({}) must match label length ({})",
                n,
                y.len()
            )));
        }

        // Balanced class weights: n / (2 * n_c).
        let n_pos = y.iter().filter(|&&v| v > 0.5).count();
        let n_neg = n - n_pos;
        let (w_pos, w_neg) = if self.params.balanced && n_pos > 0 && n_neg > 0 {
            (n as f64 / (2.0 * n_pos as f64), n as f64 / (2.0 * n_neg as f64))
        } else {
            (1.0, 1.0)
        };
        let sample_weight: Vec<f64> = y
            .iter()
            .map(|&v| if v > 0.5 { w_pos } else { w_neg })
            .collect();
        let weight_total: f64 = sample_weight.iter().sum();
        let lambda = 1.0 / (self.params.c * weight_total);

        let mut w = vec![0.0; p];
        let mut b = 0.0;

        for iter in 0..self.params.max_iter {
            let mut dw = vec![0.0; p];
            let mut db = 0.0;
            let mut loss = 0.0;

            for i in 0..n {
                let row = x.row(i);
                let z: f64 = row.iter().zip(&w).map(|(&xi, &wi)| xi * wi).sum::<f64>() + b;
                let a = Self::sigmoid(z);
                let err = sample_weight[i] * (a - y[i]);
                for j in 0..p {
                    dw[j] += err * row[j];
                }
                db += err;

                let eps = 1e-15;
                loss -= sample_weight[i]
                    * (y[i] * (a + eps).ln() + (1.0 - y[i]) * (1.0 - a + eps).ln());
            }

            let mut max_grad: f64 = 0.0;
            for j in 0..p {
                let grad = dw[j] / weight_total + lambda * w[j];
                w[j] -= self.params.learning_rate * grad;
                max_grad = max_grad.max(grad.abs());
            }
            b -= self.params.learning_rate * (db / weight_total);

            if iter % 100 == 0 {
                debug!(iter, loss = loss / weight_total, "logistic descent");
            }
            if max_grad < self.params.tol {
                break;
            }
        }

        self.weights = Some(w);
        self.bias = b;
        Ok(())
    }

    fn predict(&self, x: &Matrix) -> Result<Vec<f64>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| if p >= 0.5 { 1.0 } else { 0.0 })
            .collect())
    }
}

impl ProbabilisticClassifier for LogisticRegression {
    fn predict_proba(&self, x: &Matrix) -> Result<Vec<f64>> {
        Ok(self.scores(x)?.into_iter().map(Self::sigmoid).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Matrix, Vec<f64>) {
        let x = Matrix::from_rows(&[
            vec![0.0, 0.0],
            vec![0.5, 0.5],
            vec![1.0, 1.0],
            vec![5.0, 5.0],
            vec![5.5, 5.5],
            vec![6.0, 6.0],
        ])
        .unwrap();
        (x, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0])
    }

    fn lightly_regularized() -> LogisticRegression {
        LogisticRegression::new(LogisticParams {
            c: 1e3,
            ..LogisticParams::default()
        })
    }

    #[test]
    fn test_separates_classes() {
        let (x, y) = separable();
        let mut model = lightly_regularized();
        model.fit(&x, &y).unwrap();

        let pred = model.predict(&x).unwrap();
        assert_eq!(pred, y);
    }

    #[test]
    fn test_probabilities_are_ordered() {
        let (x, y) = separable();
        let mut model = lightly_regularized();
        model.fit(&x, &y).unwrap();

        let proba = model.predict_proba(&x).unwrap();
        assert!(proba.iter().all(|&p| (0.0..=1.0).contains(&p)));
        assert!(proba[0] < proba[5]);

        let log_proba = model.predict_log_proba(&x).unwrap();
        assert!((log_proba[5] - proba[5].ln()).abs() < 1e-12);
    }

    #[test]
    fn test_balanced_weights_recover_minority() {
        // 10:2 imbalance; unweighted descent with heavy regularization would
        // sit near the majority prior.
        let mut rows = vec![];
        let mut y = vec![];
        for i in 0..10 {
            rows.push(vec![-(1.0 + (i as f64) * 0.1)]);
            y.push(0.0);
        }
        for i in 0..2 {
            rows.push(vec![1.0 + (i as f64) * 0.1]);
            y.push(1.0);
        }
        let x = Matrix::from_rows(&rows).unwrap();

        let mut model = lightly_regularized();
        model.fit(&x, &y).unwrap();
        let pred = model.predict(&x).unwrap();
        assert_eq!(&pred[10..], &[1.0, 1.0]);
    }

    #[test]
    fn test_predict_before_fit() {
        let model = LogisticRegression::default();
        assert!(matches!(
            model.predict(&Matrix::zeros(1, 1)),
            Err(PipelineError::NotFitted(_))
        ));
    }
}
