//! Error types for the training pipeline.

use thiserror::Error;

/// Result type for pipeline operations.
pub type RnnedResult<T> = Result<T, RnnedError>;

/// Errors that can occur while preparing data or driving training.
#[derive(Debug, Error)]
pub enum RnnedError {
    /// Invalid configuration (bad hyperparameters, dimension mismatch)
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Data loading or parsing error
    #[error("Data error: {0}")]
    Data(String),

    /// Failure raised by the external sequence model
    #[error("Training error: {0}")]
    Training(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl RnnedError {
    /// Create an invalid config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a data loading error
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    /// Create a training error
    pub fn training(msg: impl Into<String>) -> Self {
        Self::Training(msg.into())
    }
}
