use propensity_core::{Column, Frame, PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sentinel category standing in for missing categorical cells.
///
/// It is always part of a fitted column's category set, even when the
/// training column has no nulls, so a test table whose nulls appear only on
/// its side still encodes cleanly.
pub const MISSING_CATEGORY: &str = "dummy";

/// One-hot encoder over the categorical (non-numeric) columns of a frame.
///
/// Categories are the sorted observed values of the training column plus
/// [`MISSING_CATEGORY`]; the first category of each set is dropped so the
/// indicators stay linearly independent. Ordinal columns pass through
/// unchanged, ahead of the indicator block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneHotEncoder {
    categories: Vec<(String, Vec<String>)>,
    fitted: bool,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the category set of every categorical column.
    pub fn fit(&mut self, frame: &Frame) {
        self.categories = frame
            .columns()
            .iter()
            .filter(|c| !c.is_numeric())
            .map(|c| {
                let mut cats = c.unique_non_null();
                cats.push(MISSING_CATEGORY.to_string());
                cats.sort();
                cats.dedup();
                (c.name().to_string(), cats)
            })
            .collect();
        self.fitted = true;
    }

    /// Names of the columns that will be expanded into indicators.
    pub fn categorical_columns(&self) -> Vec<&str> {
        self.categories.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn transform(&self, frame: &Frame) -> Result<Frame> {
        if !self.fitted {
            return Err(PipelineError::NotFitted("OneHotEncoder"));
        }

        let lookup: HashMap<&str, &Vec<String>> = self
            .categories
            .iter()
            .map(|(n, cats)| (n.as_str(), cats))
            .collect();

        for (name, _) in &self.categories {
            if frame.column(name).is_none() {
                return Err(PipelineError::ColumnNotFound(name.clone()));
            }
        }

        let mut ordinal = Vec::new();
        let mut indicators = Vec::new();

        for col in frame.columns() {
            match lookup.get(col.name()) {
                None => ordinal.push(col.clone()),
                Some(cats) => {
                    // Map each cell to its category index, nulls to the sentinel.
                    let mut idx = Vec::with_capacity(col.len());
                    for cell in col.values() {
                        let value = cell.as_deref().unwrap_or(MISSING_CATEGORY);
                        let pos = cats.iter().position(|c| c == value).ok_or_else(|| {
                            PipelineError::UnknownCategory {
                                column: col.name().to_string(),
                                value: value.to_string(),
                            }
                        })?;
                        idx.push(pos);
                    }

                    // Drop-first: one indicator per category after the first.
                    for (k, cat) in cats.iter().enumerate().skip(1) {
                        let values = idx
                            .iter()
                            .map(|&pos| Some(if pos == k { "1" } else { "0" }.to_string()))
                            .collect();
                        indicators.push(Column::new(format!("{}_{}", col.name(), cat), values));
                    }
                }
            }
        }

        ordinal.extend(indicators);
        Frame::new(ordinal)
    }

    pub fn fit_transform(&mut self, frame: &Frame) -> Result<Frame> {
        self.fit(frame);
        self.transform(frame)
    }
}

/// Encode the target column's string classes as 0..n-1 over the sorted
/// class set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, labels: &[String]) {
        let mut unique = labels.to_vec();
        unique.sort();
        unique.dedup();
        self.classes = unique;
    }

    /// Fit on a raw column; the target may not contain nulls.
    pub fn fit_column(&mut self, column: &Column) -> Result<()> {
        let labels: Vec<String> = column
            .values()
            .iter()
            .map(|v| {
                v.clone().ok_or_else(|| {
                    PipelineError::InvalidParameter(format!(
                        "target column {:?} contains missing values",
                        column.name()
                    ))
                })
            })
            .collect::<Result<_>>()?;
        self.fit(&labels);
        Ok(())
    }

    pub fn transform(&self, labels: &[String]) -> Result<Vec<f64>> {
        labels
            .iter()
            .map(|l| {
                self.classes
                    .iter()
                    .position(|c| c == l)
                    .map(|i| i as f64)
                    .ok_or_else(|| PipelineError::UnknownCategory {
                        column: "<target>".to_string(),
                        value: l.clone(),
                    })
            })
            .collect()
    }

    pub fn transform_column(&self, column: &Column) -> Result<Vec<f64>> {
        let labels: Vec<String> = column.values().iter().flatten().cloned().collect();
        if labels.len() != column.len() {
            return Err(PipelineError::InvalidParameter(format!(
                "target column {:?} contains missing values",
                column.name()
            )));
        }
        self.transform(&labels)
    }

    pub fn inverse_transform(&self, encoded: &[f64]) -> Vec<String> {
        encoded
            .iter()
            .map(|&v| self.classes[v.round() as usize].clone())
            .collect()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}
