use crate::config::PipelineConfig;
use propensity_core::{Frame, Matrix, Result};
use propensity_preprocess::{KnnImputer, OneHotEncoder, Pca, Scaler};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// The fitted preprocessing sequence: sparse-column pruning, one-hot
/// encoding, KNN imputation, scaling and PCA, fitted on the training table
/// and replayable against any table with the same schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessPipeline {
    config: PipelineConfig,
    dropped: Vec<String>,
    encoder: OneHotEncoder,
    imputer: KnnImputer,
    scaler: Scaler,
    pca: Pca,
    n_components: usize,
    feature_names: Vec<String>,
}

impl PreprocessPipeline {
    /// Fit every stage on the training table and return the pipeline along
    /// with the fully transformed training matrix.
    pub fn fit(config: PipelineConfig, train: &Frame) -> Result<(Self, Matrix)> {
        let mut train = train.clone();

        let dropped: Vec<String> = train
            .columns()
            .iter()
            .filter(|c| c.null_ratio() > config.max_null_ratio)
            .map(|c| c.name().to_string())
            .collect();
        train.drop_columns(&dropped);
        info!(
            dropped = dropped.len(),
            remaining = train.n_cols(),
            "pruned sparse columns"
        );

        let mut encoder = OneHotEncoder::new();
        let encoded = encoder.fit_transform(&train)?;
        let feature_names: Vec<String> =
            encoded.names().iter().map(|n| n.to_string()).collect();
        info!(
            categorical = encoder.categorical_columns().len(),
            width = feature_names.len(),
            "encoded categorical columns"
        );

        let raw = encoded.to_matrix()?;
        let mut imputer = KnnImputer::new(config.knn_neighbors);
        let filled = imputer.fit_transform(&raw)?;

        let mut scaler = Scaler::new(config.scaling);
        scaler.fit(&filled)?;
        let scaled = scaler.transform(&filled)?;

        let mut pca = Pca::new();
        pca.fit(&scaled)?;
        let n_components = pca.n_components_for(config.variance_retained)?;
        let cumulative = pca.cumulative_variance_ratio()?;
        debug!(?cumulative, "explained variance");
        info!(
            n_components,
            out_of = feature_names.len(),
            "selected principal components"
        );
        let projected = pca.transform(&scaled, n_components)?;

        Ok((
            PreprocessPipeline {
                config,
                dropped,
                encoder,
                imputer,
                scaler,
                pca,
                n_components,
                feature_names,
            },
            projected,
        ))
    }

    /// Replay the fitted stages against another table.
    pub fn transform(&self, frame: &Frame) -> Result<Matrix> {
        let mut frame = frame.clone();
        frame.drop_columns(&self.dropped);
        let encoded = self.encoder.transform(&frame)?;
        let raw = encoded.to_matrix()?;
        let filled = self.imputer.transform(&raw)?;
        let scaled = self.scaler.transform(&filled)?;
        self.pca.transform(&scaled, self.n_components)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn dropped_columns(&self) -> &[String] {
        &self.dropped
    }

    /// Encoded column names ahead of the PCA projection.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }
}
