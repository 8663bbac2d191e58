//! Error types for run analysis

use roster_domain::MemberId;
use thiserror::Error;

/// Errors that can occur while analyzing an assignment
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A cohort member has no group in the assignment
    #[error("Member {0} is not assigned to any group")]
    Unassigned(MemberId),
}
