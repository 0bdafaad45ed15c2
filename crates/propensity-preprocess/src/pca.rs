use propensity_core::{Matrix, PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Principal component analysis via power iteration with deflation.
///
/// `fit` extracts the full set of components from the covariance matrix of
/// the (centered) training data; callers pick how many to keep, typically
/// with [`Pca::n_components_for`], and project with [`Pca::transform`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pca {
    components: Option<Matrix>, // [n_features, n_features], one component per row
    explained_variance: Option<Vec<f64>>,
    mean: Option<Vec<f64>>,
}

const POWER_ITERATIONS: usize = 300;

impl Pca {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, x: &Matrix) -> Result<()> {
        let (n, p) = x.shape();
        if n == 0 || p == 0 {
            return Err(PipelineError::EmptyData);
        }

        let mean = x.col_means();
        let centered = center(x, &mean);

        // Covariance: C = (1/n) XᵀX over the centered data.
        let cov = centered.transpose().matmul(&centered)?;
        let mut cov: Vec<f64> = cov.data().iter().map(|&v| v / n as f64).collect();

        let mut components = Vec::with_capacity(p);
        let mut eigenvalues = Vec::with_capacity(p);

        for comp in 0..p {
            let (v, lambda) = dominant_eigenpair(&cov, p, comp);
            // Deflate: C -= λ v vᵀ
            for i in 0..p {
                for j in 0..p {
                    cov[i * p + j] -= lambda * v[i] * v[j];
                }
            }
            components.push(v);
            eigenvalues.push(lambda.max(0.0));
        }

        self.components = Some(Matrix::from_rows(&components)?);
        self.explained_variance = Some(eigenvalues);
        self.mean = Some(mean);
        Ok(())
    }

    /// Fraction of total variance carried by each component.
    pub fn explained_variance_ratio(&self) -> Result<Vec<f64>> {
        let ev = self
            .explained_variance
            .as_ref()
            .ok_or(PipelineError::NotFitted("Pca"))?;
        let total: f64 = ev.iter().sum();
        if total > 0.0 {
            Ok(ev.iter().map(|&v| v / total).collect())
        } else {
            Ok(vec![0.0; ev.len()])
        }
    }

    /// Running sum of the explained-variance ratios.
    pub fn cumulative_variance_ratio(&self) -> Result<Vec<f64>> {
        let mut cum = self.explained_variance_ratio()?;
        for i in 1..cum.len() {
            cum[i] += cum[i - 1];
        }
        Ok(cum)
    }

    /// Component count selected by the first index at which the cumulative
    /// explained-variance ratio exceeds `threshold`, never fewer than one.
    pub fn n_components_for(&self, threshold: f64) -> Result<usize> {
        let cum = self.cumulative_variance_ratio()?;
        let idx = cum
            .iter()
            .position(|&c| c > threshold)
            .unwrap_or(cum.len());
        Ok(idx.max(1))
    }

    /// Project onto the first `n_components` components.
    pub fn transform(&self, x: &Matrix, n_components: usize) -> Result<Matrix> {
        let components = self.components.as_ref().ok_or(PipelineError::NotFitted("Pca"))?;
        let mean = self.mean.as_ref().ok_or(PipelineError::NotFitted("Pca"))?;
        if n_components == 0 || n_components > components.rows() {
            return Err(PipelineError::InvalidParameter(format!(
                "n_components must be in 1..={}, got {}",
                components.rows(),
                n_components
            )));
        }

        let centered = center(x, mean);
        let top: Vec<usize> = (0..n_components).collect();
        centered.matmul(&components.select_rows(&top).transpose())
    }
}

fn center(x: &Matrix, mean: &[f64]) -> Matrix {
    let mut out = x.clone();
    for i in 0..out.rows() {
        for j in 0..out.cols() {
            out.set(i, j, x.get(i, j) - mean[j]);
        }
    }
    out
}

/// Power iteration on a dense symmetric matrix stored row-major.
fn dominant_eigenpair(cov: &[f64], p: usize, seed: usize) -> (Vec<f64>, f64) {
    // Deterministic, component-dependent start vector.
    let mut v: Vec<f64> = (0..p).map(|i| ((i + seed + 1) as f64).sin()).collect();
    normalize(&mut v);

    let mut lambda = 0.0;
    for _ in 0..POWER_ITERATIONS {
        let mut w = vec![0.0; p];
        for i in 0..p {
            for j in 0..p {
                w[i] += cov[i * p + j] * v[j];
            }
        }
        let next: f64 = w.iter().zip(&v).map(|(&wi, &vi)| wi * vi).sum();
        let norm = normalize(&mut w);
        if norm < f64::EPSILON {
            // Deflated to (numerically) nothing; remaining variance is zero.
            return (v, 0.0);
        }
        v = w;
        if (next - lambda).abs() <= 1e-12 * next.abs().max(1.0) {
            lambda = next;
            break;
        }
        lambda = next;
    }
    (v, lambda)
}

fn normalize(v: &mut [f64]) -> f64 {
    let norm = v.iter().map(|&x| x * x).sum::<f64>().sqrt();
    if norm > f64::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    norm
}
