//! Error taxonomy shared by every layer
//!
//! Each crate owns its own error enum; this is the kind every one of them
//! maps onto at the system boundary.

use std::fmt;

/// Kind of failure surfaced at the system boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid request parameters (bad k, invalid weights, unknown run)
    Configuration,

    /// Malformed or missing member data (e.g., empty cohort)
    Data,

    /// Edges dropped because of unknown endpoints; recovered locally
    PartialGraph,

    /// Solver exhausted its time budget without a feasible solution
    InfeasibleAllocation,

    /// Sink write failed; the run was rolled back
    Persistence,
}

impl ErrorKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration_error",
            ErrorKind::Data => "data_error",
            ErrorKind::PartialGraph => "partial_graph_error",
            ErrorKind::InfeasibleAllocation => "infeasible_allocation_error",
            ErrorKind::Persistence => "persistence_error",
        }
    }

    /// Whether the caller may retry (larger budget or another policy)
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::InfeasibleAllocation)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
