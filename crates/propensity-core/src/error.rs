use thiserror::Error;

/// Error type shared by every stage of the modeling pipeline.
#[derive(Debug, Error, Clone)]
pub enum PipelineError {
    #[error("shape mismatch: expected {rows}x{cols}, got {len} values")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        len: usize,
    },

    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("column not found: {0:?}")]
    ColumnNotFound(String),

    #[error("duplicate column: {0:?}")]
    DuplicateColumn(String),

    #[error("ragged table: column {column:?} has {got} rows, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        got: usize,
    },

    #[error("column {column:?} is not numeric (offending value {value:?})")]
    NonNumericColumn { column: String, value: String },

    #[error("unknown category {value:?} in column {column:?}")]
    UnknownCategory { column: String, value: String },

    #[error("{0} has not been fitted")]
    NotFitted(&'static str),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("empty data")]
    EmptyData,
}

pub type Result<T> = std::result::Result<T, PipelineError>;
