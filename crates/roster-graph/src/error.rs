//! Error types for graph construction

use thiserror::Error;

/// Errors that can occur while building a cohort graph
#[derive(Error, Debug)]
pub enum GraphError {
    /// Data source error
    #[error("Source error: {0}")]
    Source(String),

    /// Cohort has no members
    #[error("Cohort '{0}' has no members")]
    EmptyCohort(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
