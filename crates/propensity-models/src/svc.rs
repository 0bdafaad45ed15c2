use crate::Classifier;
use propensity_core::{Matrix, PipelineError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Kernel family for [`Svc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    Linear,
    Rbf,
    Poly,
}

/// Hyperparameters for [`Svc`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SvcParams {
    pub c: f64,
    pub kernel: Kernel,
    /// Polynomial degree; ignored by the other kernels.
    pub degree: u32,
    /// Additive constant of the polynomial kernel.
    pub coef0: f64,
    /// Kernel coefficient; `None` resolves to `1 / (n_features * var(X))`
    /// at fit time.
    pub gamma: Option<f64>,
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for SvcParams {
    fn default() -> Self {
        SvcParams {
            c: 5e-4,
            kernel: Kernel::Poly,
            degree: 2,
            coef0: 0.0,
            gamma: None,
            max_iter: 100,
            tol: 1e-3,
        }
    }
}

/// Support-vector classifier trained with a simplified SMO sweep.
///
/// Labels are mapped to ±1 internally; predictions are the sign of the
/// decision function. No probability estimates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Svc {
    pub params: SvcParams,
    alphas: Option<Vec<f64>>,
    bias: f64,
    gamma: f64,
    support_x: Option<Matrix>,
    support_y: Vec<f64>,
}

impl Svc {
    pub fn new(params: SvcParams) -> Self {
        Svc {
            params,
            alphas: None,
            bias: 0.0,
            gamma: 0.0,
            support_x: None,
            support_y: Vec::new(),
        }
    }

    fn kernel(&self, a: &[f64], b: &[f64]) -> f64 {
        match self.params.kernel {
            Kernel::Linear => dot(a, b),
            Kernel::Rbf => {
                let sq: f64 = a.iter().zip(b).map(|(&x, &y)| (x - y) * (x - y)).sum();
                (-self.gamma * sq).exp()
            }
            Kernel::Poly => {
                (self.gamma * dot(a, b) + self.params.coef0).powi(self.params.degree as i32)
            }
        }
    }

    /// Signed distance from the separating surface.
    pub fn decision_function(&self, x: &Matrix) -> Result<Vec<f64>> {
        let support = self
            .support_x
            .as_ref()
            .ok_or(PipelineError::NotFitted("Svc"))?;
        let alphas = self.alphas.as_ref().ok_or(PipelineError::NotFitted("Svc"))?;
        if x.cols() != support.cols() {
            return Err(PipelineError::DimensionMismatch(format!(
                "model fitted on {} features, got {}",
                support.cols(),
                x.cols()
            )));
        }

        let mut out = Vec::with_capacity(x.rows());
        for i in 0..x.rows() {
            let mut f = self.bias;
            for j in 0..support.rows() {
                if alphas[j].abs() > f64::EPSILON {
                    f += alphas[j] * self.support_y[j] * self.kernel(support.row(j), x.row(i));
                }
            }
            out.push(f);
        }
        Ok(out)
    }

    fn resolve_gamma(&self, x: &Matrix) -> f64 {
        if let Some(g) = self.params.gamma {
            return g;
        }
        let d = x.cols() as f64;
        let mean = x.data().iter().sum::<f64>() / x.data().len() as f64;
        let var = x.data().iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>()
            / x.data().len() as f64;
        if var > f64::EPSILON {
            1.0 / (d * var)
        } else {
            1.0 / d
        }
    }
}

impl Classifier for Svc {
    fn fit(&mut self, x: &Matrix, y: &[f64]) -> Result<()> {
        let n = x.rows();
        if n < 2 {
            return Err(PipelineError::EmptyData);
        }
        if n != y.len() {
            return Err(PipelineError::DimensionMismatch(format!(
                "feature rows ({}) must match label length ({})",
                n,
                y.len()
            )));
        }

        self.gamma = self.resolve_gamma(x);
        let labels: Vec<f64> = y.iter().map(|&v| if v > 0.5 { 1.0 } else { -1.0 }).collect();

        let c = self.params.c;
        let tol = self.params.tol;
        let mut alphas = vec![0.0; n];
        let mut b = 0.0;

        // Decision value for row `idx` under the current alphas.
        let f = |alphas: &[f64], b: f64, idx: usize| -> f64 {
            let mut acc = b;
            for k in 0..n {
                if alphas[k].abs() > f64::EPSILON {
                    acc += alphas[k] * labels[k] * self.kernel(x.row(k), x.row(idx));
                }
            }
            acc
        };

        for pass in 0..self.params.max_iter {
            let mut num_changed = 0;

            for i in 0..n {
                let ei = f(&alphas, b, i) - labels[i];
                let yi = labels[i];

                if !((yi * ei < -tol && alphas[i] < c) || (yi * ei > tol && alphas[i] > 0.0)) {
                    continue;
                }

                let j = (i + 1) % n;
                let yj = labels[j];
                let ej = f(&alphas, b, j) - yj;

                let ai_old = alphas[i];
                let aj_old = alphas[j];

                let (lo, hi) = if yi != yj {
                    ((aj_old - ai_old).max(0.0), (c + aj_old - ai_old).min(c))
                } else {
                    ((ai_old + aj_old - c).max(0.0), (ai_old + aj_old).min(c))
                };
                if (hi - lo).abs() < f64::EPSILON {
                    continue;
                }

                let kii = self.kernel(x.row(i), x.row(i));
                let kjj = self.kernel(x.row(j), x.row(j));
                let kij = self.kernel(x.row(i), x.row(j));
                let eta = 2.0 * kij - kii - kjj;
                if eta >= 0.0 {
                    continue;
                }

                alphas[j] = (aj_old - yj * (ei - ej) / eta).clamp(lo, hi);
                if (alphas[j] - aj_old).abs() < 1e-5 {
                    continue;
                }
                alphas[i] = ai_old + yi * yj * (aj_old - alphas[j]);

                let b1 = b - ei - yi * (alphas[i] - ai_old) * kii - yj * (alphas[j] - aj_old) * kij;
                let b2 = b - ej - yi * (alphas[i] - ai_old) * kij - yj * (alphas[j] - aj_old) * kjj;
                b = if alphas[i] > 0.0 && alphas[i] < c {
                    b1
                } else if alphas[j] > 0.0 && alphas[j] < c {
                    b2
                } else {
                    (b1 + b2) / 2.0
                };

                num_changed += 1;
            }

            if num_changed == 0 {
                debug!(pass, "smo converged");
                break;
            }
        }

        self.alphas = Some(alphas);
        self.bias = b;
        self.support_x = Some(x.clone());
        self.support_y = labels;
        Ok(())
    }

    fn predict(&self, x: &Matrix) -> Result<Vec<f64>> {
        Ok(self
            .decision_function(x)?
            .into_iter()
            .map(|f| if f >= 0.0 { 1.0 } else { 0.0 })
            .collect())
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(&x, &y)| x * y).sum()
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

    #[test]
    fn test_linear_kernel_separates() {
        let (x, y) = separable();
        let mut svc = Svc::new(SvcParams {
            c: 1.0,
            kernel: Kernel::Linear,
            ..SvcParams::default()
        });
        svc.fit(&x, &y).unwrap();

        let pred = svc.predict(&x).unwrap();
        let correct = pred
            .iter()
            .zip(&y)
            .filter(|(&p, &t)| (p - t).abs() < 0.5)
            .count();
        assert!(correct >= 4, "classified {} of 6", correct);
    }

    #[test]
    fn test_decision_function_matches_predictions() {
        let (x, y) = separable();
        let mut svc = Svc::new(SvcParams {
            c: 1.0,
            kernel: Kernel::Rbf,
            ..SvcParams::default()
        });
        svc.fit(&x, &y).unwrap();

        let decision = svc.decision_function(&x).unwrap();
        let pred = svc.predict(&x).unwrap();
        for (d, p) in decision.iter().zip(&pred) {
            assert_eq!(*p, if *d >= 0.0 { 1.0 } else { 0.0 });
        }
    }

    #[test]
    fn test_scale_gamma_resolution() {
        let (x, y) = separable();
        let mut svc = Svc::new(SvcParams {
            kernel: Kernel::Poly,
            degree: 2,
            ..SvcParams::default()
        });
        svc.fit(&x, &y).unwrap();
        // gamma = 1 / (n_features * var(X)) must be positive and finite.
        assert!(svc.gamma > 0.0 && svc.gamma.is_finite());
    }

    #[test]
    fn test_predict_before_fit() {
        let svc = Svc::new(SvcParams::default());
        assert!(matches!(
            svc.predict(&Matrix::zeros(1, 1)),
            Err(PipelineError::NotFitted(_))
        ));
    }
}
