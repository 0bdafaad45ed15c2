use propensity_core::{Matrix, PipelineError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Shuffled train/validation split.
///
/// Returns `(x_train, x_test, y_train, y_test)`.
pub fn train_test_split(
    x: &Matrix,
    y: &[f64],
    test_ratio: f64,
    seed: Option<u64>,
) -> Result<(Matrix, Matrix, Vec<f64>, Vec<f64>)> {
    let n = x.rows();
    if n != y.len() {
        return Err(PipelineError::DimensionMismatch(format!(
            "feature rows ({}) must match label length ({})",
            n,
            y.len()
        )));
    }
    if !(0.0..1.0).contains(&test_ratio) {
        return Err(PipelineError::InvalidParameter(format!(
            "test_ratio must be in [0, 1), got {}",
            test_ratio
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    indices.shuffle(&mut rng);

    let test_size = (n as f64 * test_ratio).round() as usize;
    let train_size = n - test_size;

    let (train_idx, test_idx) = indices.split_at(train_size);
    let y_train = train_idx.iter().map(|&i| y[i]).collect();
    let y_test = test_idx.iter().map(|&i| y[i]).collect();

    Ok((
        x.select_rows(train_idx),
        x.select_rows(test_idx),
        y_train,
        y_test,
    ))
}
