//! # Propensity
//!
//! Campaign-response modeling: a preprocessing pipeline over raw marketing
//! CSV tables feeding three binary classifiers, with held-out evaluation.
//!
//! ## Modules
//!
//! - **core** — `Matrix` (dense 2-D numerics), `Frame` (raw string-celled
//!   table), shared error type
//! - **io** — CSV tables in, prediction CSV out, JSON model persistence
//! - **preprocess** — sparse-column pruning, one-hot/label encoding, KNN
//!   imputation, scaling, PCA, train/validation split
//! - **models** — logistic regression, SVC (SMO), small MLP
//! - **metrics** — accuracy, confusion counts, classification report,
//!   ROC/AUC, log loss
//! - **pipeline** — the fitted preprocessing sequence as one replayable unit

/// Matrix, frame and error types.
pub use propensity_core as core;

/// CSV and JSON persistence.
pub use propensity_io as io;

/// Preprocessing stages.
pub use propensity_preprocess as preprocess;

/// Classifiers.
pub use propensity_models as models;

/// Evaluation metrics.
pub use propensity_metrics as metrics;

/// Pipeline orchestration.
pub use propensity_pipeline as pipeline;
