use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Dense 2-D matrix of `f64` — the numeric representation every pipeline
/// stage downstream of encoding operates on.
///
/// Stores values in a flat row-major `Vec<f64>`. Missing values are carried
/// as `NaN` until the imputation stage removes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

// ─── Construction ───────────────────────────────────────────────────────────

impl Matrix {
    pub fn new(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(PipelineError::ShapeMismatch {
                rows,
                cols,
                len: data.len(),
            });
        }
        Ok(Matrix { data, rows, cols })
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Build from row vectors. All rows must have the same width.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        if rows.is_empty() {
            return Ok(Matrix::zeros(0, 0));
        }
        let cols = rows[0].len();
        for row in rows {
            if row.len() != cols {
                return Err(PipelineError::DimensionMismatch(format!(
                    "expected {} columns per row, got {}",
                    cols,
                    row.len()
                )));
            }
        }
        let data: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Matrix::new(data, rows.len(), cols)
    }

    /// Build from column vectors. All columns must have the same length.
    pub fn from_columns(columns: &[Vec<f64>]) -> Result<Self> {
        if columns.is_empty() {
            return Ok(Matrix::zeros(0, 0));
        }
        let rows = columns[0].len();
        for col in columns {
            if col.len() != rows {
                return Err(PipelineError::DimensionMismatch(format!(
                    "expected {} rows per column, got {}",
                    rows,
                    col.len()
                )));
            }
        }
        let cols = columns.len();
        let mut data = vec![0.0; rows * cols];
        for (j, col) in columns.iter().enumerate() {
            for (i, &v) in col.iter().enumerate() {
                data[i * cols + j] = v;
            }
        }
        Matrix::new(data, rows, cols)
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.cols + j] = value;
    }

    /// Borrow row `i` as a contiguous slice.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn col(&self, j: usize) -> Vec<f64> {
        (0..self.rows).map(|i| self.data[i * self.cols + j]).collect()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    // ─── Transformations ────────────────────────────────────────────────────

    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Matrix {
        Matrix {
            data: self.data.iter().map(|&x| f(x)).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }

    pub fn transpose(&self) -> Matrix {
        let mut data = vec![0.0; self.data.len()];
        for i in 0..self.rows {
            for j in 0..self.cols {
                data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        Matrix {
            data,
            rows: self.cols,
            cols: self.rows,
        }
    }

    pub fn matmul(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(PipelineError::DimensionMismatch(format!(
                "matmul: inner dimensions must match, got {} and {}",
                self.cols, other.rows
            )));
        }
        let (m, k, n) = (self.rows, self.cols, other.cols);
        let mut data = vec![0.0; m * n];
        for i in 0..m {
            for p in 0..k {
                let a = self.data[i * k + p];
                if a == 0.0 {
                    continue;
                }
                for j in 0..n {
                    data[i * n + j] += a * other.data[p * n + j];
                }
            }
        }
        Matrix::new(data, m, n)
    }

    /// Gather the given rows into a new matrix, in index order.
    pub fn select_rows(&self, indices: &[usize]) -> Matrix {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Matrix {
            data,
            rows: indices.len(),
            cols: self.cols,
        }
    }

    // ─── Column statistics ──────────────────────────────────────────────────

    pub fn col_means(&self) -> Vec<f64> {
        let mut means = vec![0.0; self.cols];
        for i in 0..self.rows {
            for j in 0..self.cols {
                means[j] += self.data[i * self.cols + j];
            }
        }
        let n = self.rows.max(1) as f64;
        for m in means.iter_mut() {
            *m /= n;
        }
        means
    }

    /// Population (ddof = 0) standard deviation of each column.
    pub fn col_stds(&self) -> Vec<f64> {
        let means = self.col_means();
        let mut vars = vec![0.0; self.cols];
        for i in 0..self.rows {
            for j in 0..self.cols {
                let d = self.data[i * self.cols + j] - means[j];
                vars[j] += d * d;
            }
        }
        let n = self.rows.max(1) as f64;
        vars.iter().map(|v| (v / n).sqrt()).collect()
    }

    pub fn has_nan(&self) -> bool {
        self.data.iter().any(|v| v.is_nan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction() {
        let m = Matrix::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.get(1, 2), 6.0);
        assert!(Matrix::new(vec![1.0], 2, 3).is_err());
    }

    #[test]
    fn test_from_rows_and_columns() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let b = Matrix::from_columns(&[vec![1.0, 3.0], vec![2.0, 4.0]]).unwrap();
        assert_eq!(a, b);
        assert!(Matrix::from_rows(&[vec![1.0], vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn test_matmul() {
        let a = Matrix::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        let b = Matrix::new(vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0], 3, 2).unwrap();
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.shape(), (2, 2));
        assert_eq!(c.data(), &[58.0, 64.0, 139.0, 154.0]);
        assert!(b.matmul(&c).is_err());
    }

    #[test]
    fn test_transpose() {
        let a = Matrix::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        let t = a.transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.get(0, 1), 4.0);
        assert_eq!(t.get(2, 0), 3.0);
    }

    #[test]
    fn test_column_stats() {
        let m = Matrix::from_rows(&[vec![1.0, 10.0], vec![3.0, 20.0], vec![5.0, 30.0]]).unwrap();
        assert_eq!(m.col_means(), vec![3.0, 20.0]);
        let stds = m.col_stds();
        assert!((stds[0] - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_select_rows() {
        let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        let s = m.select_rows(&[2, 0]);
        assert_eq!(s.row(0), &[5.0, 6.0]);
        assert_eq!(s.row(1), &[1.0, 2.0]);
    }

    #[test]
    fn test_nan_tracking() {
        let mut m = Matrix::zeros(2, 2);
        assert!(!m.has_nan());
        m.set(0, 1, f64::NAN);
        assert!(m.has_nan());
    }
}
