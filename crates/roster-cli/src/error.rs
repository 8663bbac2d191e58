//! Error types for the CLI application.

use roster_domain::ErrorKind;
use roster_pipeline::PipelineError;
use roster_store::StoreError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pipeline error
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Storage error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CliError {
    /// Process exit code, one per boundary error kind
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Pipeline(e) => match e.kind() {
                ErrorKind::Configuration => 2,
                ErrorKind::Data => 3,
                ErrorKind::PartialGraph => 4,
                ErrorKind::InfeasibleAllocation => 5,
                ErrorKind::Persistence => 6,
            },
            CliError::Config(_) | CliError::Toml(_) | CliError::InvalidInput(_) => 2,
            CliError::Serialization(_) => 3,
            CliError::Store(_) | CliError::Io(_) => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_kind() {
        let infeasible = CliError::from(PipelineError::Infeasible("budget".into()));
        assert_eq!(infeasible.exit_code(), 5);

        let data = CliError::from(PipelineError::Data("empty cohort".into()));
        assert_eq!(data.exit_code(), 3);

        assert_eq!(CliError::InvalidInput("k".into()).exit_code(), 2);
    }

    #[test]
    fn test_pipeline_message_passes_through() {
        let err = CliError::from(PipelineError::Config("run 7 not found".into()));
        assert_eq!(err.to_string(), "Configuration error: run 7 not found");
    }
}
