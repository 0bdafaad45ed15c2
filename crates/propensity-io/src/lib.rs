pub mod csv_io;
pub mod model_io;

pub use csv_io::{read_frame, write_predictions};
pub use model_io::{load_json, save_json};

use thiserror::Error;

/// I/O-layer error: file, CSV and JSON failures plus anything the pipeline
/// itself rejects while materializing data.
#[derive(Debug, Error)]
pub enum IoError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Pipeline(#[from] propensity_core::PipelineError),
}

pub type IoResult<T> = std::result::Result<T, IoError>;
