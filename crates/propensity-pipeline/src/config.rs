use propensity_preprocess::Scaling;
use serde::{Deserialize, Serialize};

/// Knobs for the preprocessing sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Columns with a higher training-set null ratio are dropped.
    pub max_null_ratio: f64,
    /// Neighbors consulted when imputing a missing numeric value.
    pub knn_neighbors: usize,
    pub scaling: Scaling,
    /// Cumulative explained-variance threshold that picks the component
    /// count after PCA.
    pub variance_retained: f64,
    /// Fraction of the training table held out for validation.
    pub test_ratio: f64,
    pub seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            max_null_ratio: 0.5,
            knn_neighbors: 2,
            scaling: Scaling::Standard,
            variance_retained: 0.999,
            test_ratio: 0.3,
            seed: 42,
        }
    }
}
