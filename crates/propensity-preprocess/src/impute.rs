use propensity_core::{Matrix, PipelineError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// K-nearest-neighbor imputer for the `NaN` cells left in ordinal columns.
///
/// Distances are NaN-aware Euclidean: computed over the coordinates both
/// rows observe and rescaled by `n_features / n_observed`. A donor row must
/// observe the feature being filled; when no donor qualifies the training
/// column mean is used instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnImputer {
    pub k: usize,
    train: Option<Matrix>,
    col_means: Option<Vec<f64>>,
}

impl KnnImputer {
    pub fn new(k: usize) -> Self {
        KnnImputer {
            k: k.max(1),
            train: None,
            col_means: None,
        }
    }

    pub fn fit(&mut self, x: &Matrix) -> Result<()> {
        if x.rows() == 0 {
            return Err(PipelineError::EmptyData);
        }

        // Per-column mean over observed values only.
        let mut sums = vec![0.0; x.cols()];
        let mut counts = vec![0usize; x.cols()];
        for i in 0..x.rows() {
            for (j, &v) in x.row(i).iter().enumerate() {
                if !v.is_nan() {
                    sums[j] += v;
                    counts[j] += 1;
                }
            }
        }
        let means = sums
            .iter()
            .zip(&counts)
            .map(|(&s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
            .collect();

        self.train = Some(x.clone());
        self.col_means = Some(means);
        Ok(())
    }

    pub fn transform(&self, x: &Matrix) -> Result<Matrix> {
        let train = self.train.as_ref().ok_or(PipelineError::NotFitted("KnnImputer"))?;
        let means = self.col_means.as_ref().ok_or(PipelineError::NotFitted("KnnImputer"))?;
        if x.cols() != train.cols() {
            return Err(PipelineError::DimensionMismatch(format!(
                "imputer fitted on {} columns, got {}",
                train.cols(),
                x.cols()
            )));
        }

        let filled: Vec<Vec<f64>> = (0..x.rows())
            .into_par_iter()
            .map(|i| self.impute_row(x.row(i), train, means))
            .collect();

        Matrix::from_rows(&filled)
    }

    pub fn fit_transform(&mut self, x: &Matrix) -> Result<Matrix> {
        self.fit(x)?;
        self.transform(x)
    }

    fn impute_row(&self, row: &[f64], train: &Matrix, means: &[f64]) -> Vec<f64> {
        let mut out = row.to_vec();
        if !row.iter().any(|v| v.is_nan()) {
            return out;
        }

        for j in 0..row.len() {
            if !row[j].is_nan() {
                continue;
            }

            // Candidate donors: training rows that observe feature j.
            let mut donors: Vec<(f64, f64)> = (0..train.rows())
                .filter_map(|t| {
                    let donor = train.row(t);
                    if donor[j].is_nan() {
                        return None;
                    }
                    nan_euclidean(row, donor).map(|d| (d, donor[j]))
                })
                .collect();

            if donors.is_empty() {
                out[j] = means[j];
                continue;
            }

            donors.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
            let k = self.k.min(donors.len());
            out[j] = donors[..k].iter().map(|&(_, v)| v).sum::<f64>() / k as f64;
        }
        out
    }
}

/// Euclidean distance over mutually observed coordinates, rescaled by the
/// fraction observed. `None` when the rows share no observed coordinate.
fn nan_euclidean(a: &[f64], b: &[f64]) -> Option<f64> {
    let mut sum_sq = 0.0;
    let mut observed = 0usize;
    for (&x, &y) in a.iter().zip(b) {
        if x.is_nan() || y.is_nan() {
            continue;
        }
        sum_sq += (x - y) * (x - y);
        observed += 1;
    }
    if observed == 0 {
        None
    } else {
        Some((sum_sq * a.len() as f64 / observed as f64).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_euclidean_rescales() {
        let a = [1.0, f64::NAN, 3.0, 4.0];
        let b = [1.0, 2.0, 3.0, 8.0];
        // Only 3 of 4 coordinates shared: sqrt(16 * 4/3).
        let d = nan_euclidean(&a, &b).unwrap();
        assert!((d - (16.0f64 * 4.0 / 3.0).sqrt()).abs() < 1e-12);

        let c = [f64::NAN, f64::NAN];
        assert!(nan_euclidean(&c, &[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_fills_from_nearest_neighbors() {
        let train = Matrix::from_rows(&[
            vec![1.0, 10.0],
            vec![1.1, 12.0],
            vec![9.0, 100.0],
        ])
        .unwrap();
        let mut imputer = KnnImputer::new(2);
        imputer.fit(&train).unwrap();

        let test = Matrix::from_rows(&[vec![1.05, f64::NAN]]).unwrap();
        let filled = imputer.transform(&test).unwrap();

        // The two close rows donate: (10 + 12) / 2.
        assert!((filled.get(0, 1) - 11.0).abs() < 1e-12);
        assert!(!filled.has_nan());
    }

    #[test]
    fn test_self_row_never_donates_its_own_gap() {
        let train = Matrix::from_rows(&[
            vec![1.0, f64::NAN],
            vec![1.0, 5.0],
            vec![1.0, 7.0],
        ])
        .unwrap();
        let mut imputer = KnnImputer::new(2);
        let filled = imputer.fit_transform(&train).unwrap();

        // Row 0's gap is filled from the two donors that observe column 1.
        assert!((filled.get(0, 1) - 6.0).abs() < 1e-12);
        assert_eq!(filled.get(1, 1), 5.0);
    }

    #[test]
    fn test_column_mean_fallback() {
        // No training row observes column 1 together with anything useful:
        // the single donor column is entirely missing.
        let train = Matrix::from_rows(&[vec![1.0, f64::NAN], vec![2.0, f64::NAN]]).unwrap();
        let mut imputer = KnnImputer::new(2);
        imputer.fit(&train).unwrap();

        let filled = imputer.transform(&train).unwrap();
        // No donor observes the feature; falls back to the (empty) column
        // mean, which defaults to 0.
        assert_eq!(filled.get(0, 1), 0.0);
    }

    #[test]
    fn test_transform_before_fit() {
        let imputer = KnnImputer::new(2);
        let x = Matrix::zeros(1, 1);
        assert!(matches!(
            imputer.transform(&x),
            Err(PipelineError::NotFitted(_))
        ));
    }
}
