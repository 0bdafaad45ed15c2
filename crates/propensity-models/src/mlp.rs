use crate::{Classifier, ProbabilisticClassifier};
use propensity_core::{Matrix, PipelineError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Hyperparameters for [`MlpClassifier`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MlpParams {
    /// Hidden layer widths, input to output.
    pub hidden: Vec<usize>,
    /// L2 penalty on the weights.
    pub alpha: f64,
    pub learning_rate: f64,
    pub max_iter: usize,
    pub seed: u64,
}

impl Default for MlpParams {
    fn default() -> Self {
        MlpParams {
            hidden: vec![7],
            alpha: 0.01,
            learning_rate: 0.5,
            max_iter: 1000,
            seed: 1,
        }
    }
}

/// One fully-connected layer: `z = aW + b`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Dense {
    w: Matrix,
    b: Vec<f64>,
}

impl Dense {
    /// Xavier-uniform initialization.
    fn new(fan_in: usize, fan_out: usize, rng: &mut StdRng) -> Result<Self> {
        let scale = (6.0 / (fan_in + fan_out) as f64).sqrt();
        let data: Vec<f64> = (0..fan_in * fan_out)
            .map(|_| rng.gen::<f64>() * 2.0 * scale - scale)
            .collect();
        Ok(Dense {
            w: Matrix::new(data, fan_in, fan_out)?,
            b: vec![0.0; fan_out],
        })
    }

    fn affine(&self, a: &Matrix) -> Result<Matrix> {
        let mut z = a.matmul(&self.w)?;
        for i in 0..z.rows() {
            for j in 0..z.cols() {
                z.set(i, j, z.get(i, j) + self.b[j]);
            }
        }
        Ok(z)
    }
}

/// Small feed-forward network: ReLU hidden layers, sigmoid output, trained
/// by full-batch gradient descent on L2-regularized cross-entropy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpClassifier {
    pub params: MlpParams,
    layers: Option<Vec<Dense>>,
}

impl MlpClassifier {
    pub fn new(params: MlpParams) -> Self {
        MlpClassifier {
            params,
            layers: None,
        }
    }

    /// Activations after every layer, input first.
    fn forward(layers: &[Dense], x: &Matrix) -> Result<Vec<Matrix>> {
        let mut acts = vec![x.clone()];
        let last = layers.len() - 1;
        for (l, layer) in layers.iter().enumerate() {
            let z = layer.affine(acts.last().ok_or(PipelineError::EmptyData)?)?;
            let a = if l == last {
                z.map(|v| 1.0 / (1.0 + (-v).exp()))
            } else {
                z.map(|v| v.max(0.0))
            };
            acts.push(a);
        }
        Ok(acts)
    }
}

impl Default for MlpClassifier {
    fn default() -> Self {
        Self::new(MlpParams::default())
    }
}

impl Classifier for MlpClassifier {
    fn fit(&mut self, x: &Matrix, y: &[f64]) -> Result<()> {
        let (n, d) = x.shape();
        if n == 0 || d == 0 {
            return Err(PipelineError::EmptyData);
        }
        if n != y.len() {
            return Err(PipelineError::DimensionMismatch(format!(
                "feature rows ({}) must match label length ({})",
                n,
                y.len()
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut sizes = vec![d];
        sizes.extend(self.params.hidden.iter().copied());
        sizes.push(1);

        let mut layers: Vec<Dense> = sizes
            .windows(2)
            .map(|w| Dense::new(w[0], w[1], &mut rng))
            .collect::<Result<_>>()?;

        let n_f = n as f64;
        let lr = self.params.learning_rate;
        let alpha = self.params.alpha;

        for iter in 0..self.params.max_iter {
            let acts = Self::forward(&layers, x)?;
            let output = acts.last().ok_or(PipelineError::EmptyData)?;

            // delta for the sigmoid + cross-entropy head: (p - y) / n.
            let mut delta = Matrix::zeros(n, 1);
            for i in 0..n {
                delta.set(i, 0, (output.get(i, 0) - y[i]) / n_f);
            }

            for l in (0..layers.len()).rev() {
                let prev = &acts[l];
                let grad_w = prev.transpose().matmul(&delta)?;
                let grad_b: Vec<f64> = (0..delta.cols())
                    .map(|j| delta.col(j).iter().sum())
                    .collect();

                // Propagate before the update so the old weights are used.
                let next_delta = if l > 0 {
                    let mut back = delta.matmul(&layers[l].w.transpose())?;
                    for i in 0..back.rows() {
                        for j in 0..back.cols() {
                            if prev.get(i, j) <= 0.0 {
                                back.set(i, j, 0.0);
                            }
                        }
                    }
                    Some(back)
                } else {
                    None
                };

                let layer = &mut layers[l];
                for i in 0..layer.w.rows() {
                    for j in 0..layer.w.cols() {
                        let g = grad_w.get(i, j) + alpha * layer.w.get(i, j) / n_f;
                        layer.w.set(i, j, layer.w.get(i, j) - lr * g);
                    }
                }
                for (bj, &gb) in layer.b.iter_mut().zip(&grad_b) {
                    *bj -= lr * gb;
                }

                if let Some(nd) = next_delta {
                    delta = nd;
                }
            }

            if iter % 100 == 0 {
                let eps = 1e-15;
                let loss: f64 = (0..n)
                    .map(|i| {
                        let p = output.get(i, 0).clamp(eps, 1.0 - eps);
                        -(y[i] * p.ln() + (1.0 - y[i]) * (1.0 - p).ln())
                    })
                    .sum::<f64>()
                    / n_f;
                debug!(iter, loss, "mlp descent");
            }
        }

        self.layers = Some(layers);
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

impl ProbabilisticClassifier for MlpClassifier {
    fn predict_proba(&self, x: &Matrix) -> Result<Vec<f64>> {
        let layers = self
            .layers
            .as_ref()
            .ok_or(PipelineError::NotFitted("MlpClassifier"))?;
        if x.cols() != layers[0].w.rows() {
            return Err(PipelineError::DimensionMismatch(format!(
                "model fitted on {} features, got {}",
                layers[0].w.rows(),
                x.cols()
            )));
        }
        let acts = Self::forward(layers, x)?;
        Ok(acts.last().ok_or(PipelineError::EmptyData)?.col(0))
    }
}
