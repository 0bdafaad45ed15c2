use crate::error::{PipelineError, Result};
use crate::matrix::Matrix;
use serde::{Deserialize, Serialize};

/// A single named column of raw cells as read from CSV.
///
/// Cells are kept as strings until the encoding stage decides whether the
/// column is ordinal (numeric) or categorical; `None` marks a missing value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    name: String,
    values: Vec<Option<String>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Column {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    pub fn push(&mut self, value: Option<String>) {
        self.values.push(value);
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Fraction of missing cells, 0.0 for an empty column.
    pub fn null_ratio(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.null_count() as f64 / self.values.len() as f64
        }
    }

    /// A column is ordinal when every observed cell parses as a float.
    pub fn is_numeric(&self) -> bool {
        self.values
            .iter()
            .flatten()
            .all(|v| v.trim().parse::<f64>().is_ok())
    }

    /// Parse into floats, missing cells becoming `NaN`.
    pub fn numeric_values(&self) -> Result<Vec<f64>> {
        self.values
            .iter()
            .map(|cell| match cell {
                None => Ok(f64::NAN),
                Some(v) => v.trim().parse::<f64>().map_err(|_| {
                    PipelineError::NonNumericColumn {
                        column: self.name.clone(),
                        value: v.clone(),
                    }
                }),
            })
            .collect()
    }

    /// Sorted, deduplicated observed values.
    pub fn unique_non_null(&self) -> Vec<String> {
        let mut unique: Vec<String> = self.values.iter().flatten().cloned().collect();
        unique.sort();
        unique.dedup();
        unique
    }
}

/// A table of named columns, all of equal length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    columns: Vec<Column>,
}

impl Frame {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            for col in &columns {
                if col.len() != expected {
                    return Err(PipelineError::RaggedColumn {
                        column: col.name().to_string(),
                        expected,
                        got: col.len(),
                    });
                }
            }
        }
        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name() == col.name()) {
                return Err(PipelineError::DuplicateColumn(col.name().to_string()));
            }
        }
        Ok(Frame { columns })
    }

    pub fn empty() -> Self {
        Frame { columns: Vec::new() }
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Remove a column and return it.
    pub fn take_column(&mut self, name: &str) -> Result<Column> {
        let idx = self
            .columns
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| PipelineError::ColumnNotFound(name.to_string()))?;
        Ok(self.columns.remove(idx))
    }

    /// Drop every named column that exists; unknown names are ignored so the
    /// same drop list can be replayed against the test table.
    pub fn drop_columns(&mut self, names: &[String]) {
        self.columns.retain(|c| !names.iter().any(|n| n == c.name()));
    }

    pub fn add_column(&mut self, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.n_rows() {
            return Err(PipelineError::RaggedColumn {
                column: column.name().to_string(),
                expected: self.n_rows(),
                got: column.len(),
            });
        }
        if self.column(column.name()).is_some() {
            return Err(PipelineError::DuplicateColumn(column.name().to_string()));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Convert to a numeric matrix. Every column must be ordinal by this
    /// point; missing cells surface as `NaN` for the imputer.
    pub fn to_matrix(&self) -> Result<Matrix> {
        let cols: Vec<Vec<f64>> = self
            .columns
            .iter()
            .map(Column::numeric_values)
            .collect::<Result<_>>()?;
        Matrix::from_columns(&cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(vals: &[&str]) -> Vec<Option<String>> {
        vals.iter()
            .map(|v| {
                if v.is_empty() {
                    None
                } else {
                    Some(v.to_string())
                }
            })
            .collect()
    }

    #[test]
    fn test_null_accounting() {
        let col = Column::new("age", cells(&["34", "", "51", ""]));
        assert_eq!(col.null_count(), 2);
        assert!((col.null_ratio() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_numeric_detection() {
        let ordinal = Column::new("age", cells(&["34", "", "51.5"]));
        let categorical = Column::new("job", cells(&["admin", "services", ""]));
        assert!(ordinal.is_numeric());
        assert!(!categorical.is_numeric());

        let parsed = ordinal.numeric_values().unwrap();
        assert_eq!(parsed[0], 34.0);
        assert!(parsed[1].is_nan());
        assert!(categorical.numeric_values().is_err());
    }

    #[test]
    fn test_frame_invariants() {
        let frame = Frame::new(vec![
            Column::new("a", cells(&["1", "2"])),
            Column::new("b", cells(&["x", "y"])),
        ])
        .unwrap();
        assert_eq!(frame.n_rows(), 2);
        assert_eq!(frame.names(), vec!["a", "b"]);

        let ragged = Frame::new(vec![
            Column::new("a", cells(&["1", "2"])),
            Column::new("b", cells(&["x"])),
        ]);
        assert!(ragged.is_err());

        let dup = Frame::new(vec![
            Column::new("a", cells(&["1"])),
            Column::new("a", cells(&["2"])),
        ]);
        assert!(dup.is_err());
    }

    #[test]
    fn test_take_and_drop() {
        let mut frame = Frame::new(vec![
            Column::new("a", cells(&["1", "2"])),
            Column::new("responded", cells(&["yes", "no"])),
            Column::new("c", cells(&["3", "4"])),
        ])
        .unwrap();

        let target = frame.take_column("responded").unwrap();
        assert_eq!(target.values()[0].as_deref(), Some("yes"));
        assert_eq!(frame.n_cols(), 2);

        frame.drop_columns(&["c".to_string(), "missing".to_string()]);
        assert_eq!(frame.names(), vec!["a"]);
    }

    #[test]
    fn test_to_matrix_nan_passthrough() {
        let frame = Frame::new(vec![
            Column::new("a", cells(&["1", ""])),
            Column::new("b", cells(&["3", "4"])),
        ])
        .unwrap();
        let m = frame.to_matrix().unwrap();
        assert_eq!(m.shape(), (2, 2));
        assert_eq!(m.get(0, 0), 1.0);
        assert!(m.get(1, 0).is_nan());
        assert!(m.has_nan());
    }
}
