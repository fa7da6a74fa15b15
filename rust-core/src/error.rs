//! Error types shared by every processing stage

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DenoiseError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Adaptive filter diverged: weight norm {norm} exceeds limit {limit}")]
    NumericInstability { norm: f32, limit: f32 },

    #[error("FFT processing failed: {0}")]
    Transform(String),

    #[error("Resampling failed: {0}")]
    Resample(String),
}

impl DenoiseError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        DenoiseError::InvalidArgument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, DenoiseError>;
