//! Error types for clustering and allocation

use thiserror::Error;

/// Errors that can occur during hint clustering or allocation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllocatorError {
    /// Invalid k, weights or policy settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Inputs disagree with each other (lengths, dimensions)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No feasible solution within the time budget
    #[error("Infeasible allocation: {0}")]
    Infeasible(String),
}
