//! Error types for graph encoding

use thiserror::Error;

/// Errors that can occur during embedding generation
#[derive(Error, Debug)]
pub enum EncoderError {
    /// Graph has no members
    #[error("Cannot encode an empty graph")]
    EmptyGraph,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Feature matrix is malformed
    #[error("Invalid features: {0}")]
    InvalidFeatures(String),

    /// Training diverged
    #[error("Training failed: {0}")]
    TrainingFailed(String),
}
