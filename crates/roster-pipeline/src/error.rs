//! Error types for the allocation pipeline

use roster_allocator::AllocatorError;
use roster_analysis::AnalysisError;
use roster_domain::{AssignmentError, ErrorKind, StageError};
use roster_encoder::EncoderError;
use roster_graph::GraphError;
use thiserror::Error;

/// Errors surfaced by pipeline operations
///
/// Every variant maps onto one boundary [`ErrorKind`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Invalid request: bad k, invalid weights, unknown run or member
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or malformed cohort data
    #[error("Data error: {0}")]
    Data(String),

    /// No feasible allocation within the time budget
    #[error("Infeasible allocation: {0}")]
    Infeasible(String),

    /// The run could not be written; nothing was committed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A worker task died before finishing its run
    #[error("Worker error: {0}")]
    Worker(String),
}

impl PipelineError {
    /// Boundary error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Config(_) => ErrorKind::Configuration,
            PipelineError::Data(_) => ErrorKind::Data,
            PipelineError::Infeasible(_) => ErrorKind::InfeasibleAllocation,
            // A lost worker never reached the sink, so the run is treated as rolled back
            PipelineError::Persistence(_) | PipelineError::Worker(_) => ErrorKind::Persistence,
        }
    }

    /// Whether the caller may retry with a larger budget or another policy
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl From<GraphError> for PipelineError {
    fn from(e: GraphError) -> Self {
        match e {
            GraphError::Config(_) => PipelineError::Config(e.to_string()),
            GraphError::EmptyCohort(_) | GraphError::Source(_) => PipelineError::Data(e.to_string()),
        }
    }
}

impl From<EncoderError> for PipelineError {
    fn from(e: EncoderError) -> Self {
        match e {
            EncoderError::Config(_) => PipelineError::Config(e.to_string()),
            EncoderError::EmptyGraph
            | EncoderError::InvalidFeatures(_)
            | EncoderError::TrainingFailed(_) => PipelineError::Data(e.to_string()),
        }
    }
}

impl From<AllocatorError> for PipelineError {
    fn from(e: AllocatorError) -> Self {
        match e {
            AllocatorError::Config(_) => PipelineError::Config(e.to_string()),
            AllocatorError::InvalidInput(_) => PipelineError::Data(e.to_string()),
            AllocatorError::Infeasible(_) => PipelineError::Infeasible(e.to_string()),
        }
    }
}

impl From<AnalysisError> for PipelineError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::Config(_) => PipelineError::Config(e.to_string()),
            AnalysisError::Unassigned(_) => PipelineError::Data(e.to_string()),
        }
    }
}

impl From<AssignmentError> for PipelineError {
    fn from(e: AssignmentError) -> Self {
        PipelineError::Config(e.to_string())
    }
}

impl From<StageError> for PipelineError {
    fn from(e: StageError) -> Self {
        PipelineError::Config(e.to_string())
    }
}
