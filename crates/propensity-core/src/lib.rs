pub mod error;
pub mod frame;
pub mod matrix;

pub use error::{PipelineError, Result};
pub use frame::{Column, Frame};
pub use matrix::Matrix;
