use propensity_core::{Matrix, PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Which scaling to apply after imputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scaling {
    Standard,
    MinMax,
}

/// Standardize features by removing the mean and scaling to unit variance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Option<Vec<f64>>,
    std: Option<Vec<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, x: &Matrix) -> Result<()> {
        if x.rows() == 0 {
            return Err(PipelineError::EmptyData);
        }
        self.mean = Some(x.col_means());
        self.std = Some(x.col_stds());
        Ok(())
    }

    pub fn transform(&self, x: &Matrix) -> Result<Matrix> {
        let mean = self.mean.as_ref().ok_or(PipelineError::NotFitted("StandardScaler"))?;
        let std = self.std.as_ref().ok_or(PipelineError::NotFitted("StandardScaler"))?;
        scale_columns(x, mean, std, |v, m, s| (v - m) / if s.abs() < f64::EPSILON { 1.0 } else { s })
    }

    pub fn fit_transform(&mut self, x: &Matrix) -> Result<Matrix> {
        self.fit(x)?;
        self.transform(x)
    }
}

/// Scale features to the [0, 1] range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: Option<Vec<f64>>,
    max: Option<Vec<f64>>,
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, x: &Matrix) -> Result<()> {
        if x.rows() == 0 {
            return Err(PipelineError::EmptyData);
        }
        let mut min = vec![f64::INFINITY; x.cols()];
        let mut max = vec![f64::NEG_INFINITY; x.cols()];
        for i in 0..x.rows() {
            for (j, &v) in x.row(i).iter().enumerate() {
                min[j] = min[j].min(v);
                max[j] = max[j].max(v);
            }
        }
        self.min = Some(min);
        self.max = Some(max);
        Ok(())
    }

    pub fn transform(&self, x: &Matrix) -> Result<Matrix> {
        let min = self.min.as_ref().ok_or(PipelineError::NotFitted("MinMaxScaler"))?;
        let max = self.max.as_ref().ok_or(PipelineError::NotFitted("MinMaxScaler"))?;
        let range: Vec<f64> = min.iter().zip(max).map(|(&lo, &hi)| hi - lo).collect();
        scale_columns(x, min, &range, |v, lo, r| {
            (v - lo) / if r.abs() < f64::EPSILON { 1.0 } else { r }
        })
    }

    pub fn fit_transform(&mut self, x: &Matrix) -> Result<Matrix> {
        self.fit(x)?;
        self.transform(x)
    }
}

/// A fitted scaler of either kind, so the pipeline can persist one slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Scaler {
    Standard(StandardScaler),
    MinMax(MinMaxScaler),
}

impl Scaler {
    pub fn new(kind: Scaling) -> Self {
        match kind {
            Scaling::Standard => Scaler::Standard(StandardScaler::new()),
            Scaling::MinMax => Scaler::MinMax(MinMaxScaler::new()),
        }
    }

    pub fn fit(&mut self, x: &Matrix) -> Result<()> {
        match self {
            Scaler::Standard(s) => s.fit(x),
            Scaler::MinMax(s) => s.fit(x),
        }
    }

    pub fn transform(&self, x: &Matrix) -> Result<Matrix> {
        match self {
            Scaler::Standard(s) => s.transform(x),
            Scaler::MinMax(s) => s.transform(x),
        }
    }
}

fn scale_columns<F>(x: &Matrix, a: &[f64], b: &[f64], f: F) -> Result<Matrix>
where
    F: Fn(f64, f64, f64) -> f64,
{
    if x.cols() != a.len() {
        return Err(PipelineError::DimensionMismatch(format!(
            "scaler fitted on {} columns, got {}",
            a.len(),
            x.cols()
        )));
    }
    let mut out = x.clone();
    for i in 0..out.rows() {
        for j in 0..out.cols() {
            out.set(i, j, f(x.get(i, j), a[j], b[j]));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_scaler() {
        let x = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        let mut scaler = StandardScaler::new();
        let out = scaler.fit_transform(&x).unwrap();

        for j in 0..2 {
            let col = out.col(j);
            let mean: f64 = col.iter().sum::<f64>() / col.len() as f64;
            assert!(mean.abs() < 1e-10);
        }
    }

    #[test]
    fn test_standard_scaler_constant_column() {
        let x = Matrix::from_rows(&[vec![7.0], vec![7.0]]).unwrap();
        let mut scaler = StandardScaler::new();
        let out = scaler.fit_transform(&x).unwrap();
        // Zero-variance columns center to zero rather than dividing by zero.
        assert_eq!(out.col(0), vec![0.0, 0.0]);
    }

    #[test]
    fn test_minmax_scaler() {
        let x = Matrix::from_rows(&[vec![1.0, 10.0], vec![5.0, 20.0], vec![3.0, 30.0]]).unwrap();
        let mut scaler = MinMaxScaler::new();
        let out = scaler.fit_transform(&x).unwrap();

        for j in 0..2 {
            let col = out.col(j);
            let min = col.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = col.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            assert!(min.abs() < 1e-10);
            assert!((max - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_transform_uses_training_statistics() {
        let train = Matrix::from_rows(&[vec![0.0], vec![10.0]]).unwrap();
        let test = Matrix::from_rows(&[vec![20.0]]).unwrap();
        let mut scaler = MinMaxScaler::new();
        scaler.fit(&train).unwrap();
        // Values outside the training range extrapolate past 1.
        assert!((scaler.transform(&test).unwrap().get(0, 0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_scaler_dispatch() {
        let x = Matrix::from_rows(&[vec![1.0], vec![3.0]]).unwrap();
        let mut scaler = Scaler::new(Scaling::MinMax);
        scaler.fit(&x).unwrap();
        let out = scaler.transform(&x).unwrap();
        assert_eq!(out.col(0), vec![0.0, 1.0]);
    }
}
