//! Request and result types for pipeline operations

use roster_allocator::{ObjectiveWeights, PolicyKind, SearchStats};
use roster_analysis::{GroupProfile, PreservationReport};
use roster_domain::{GroupId, MemberId, Run, RunId};
use roster_graph::GraphDiagnostics;
use std::collections::BTreeMap;

/// Request to allocate one cohort into `group_count` groups
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRequest {
    /// Cohort to allocate
    pub cohort: String,

    /// Target number of groups (k)
    pub group_count: usize,

    /// Policy override; the configured policy when `None`
    pub policy: Option<PolicyKind>,

    /// Weight override; the configured weights when `None`
    pub weights: Option<ObjectiveWeights>,
}

impl AllocationRequest {
    /// Request with the configured policy and weights
    pub fn new(cohort: impl Into<String>, group_count: usize) -> Self {
        Self {
            cohort: cohort.into(),
            group_count,
            policy: None,
            weights: None,
        }
    }

    /// Override the allocation policy
    pub fn with_policy(mut self, policy: PolicyKind) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Override the objective weights
    pub fn with_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.weights = Some(weights);
        self
    }
}

/// Output of a completed, persisted allocation
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationResult {
    /// New run
    pub run_id: RunId,

    /// Cohort allocated
    pub cohort: String,

    /// Members allocated
    pub total_members: usize,

    /// Groups formed
    pub total_groups: usize,

    /// Members of each group
    pub groups: BTreeMap<GroupId, Vec<MemberId>>,

    /// Mean of each tracked attribute per group
    pub group_averages: BTreeMap<GroupId, BTreeMap<String, f64>>,

    /// Policy label recorded with the run
    pub policy: String,

    /// Objective value of the final assignment
    pub objective: f64,

    /// Search counters
    pub stats: SearchStats,

    /// Findings from graph construction
    pub diagnostics: GraphDiagnostics,
}

/// Output of a manual single-member move
#[derive(Debug, Clone, PartialEq)]
pub struct ReallocationResult {
    /// Run holding the corrected assignment
    pub new_run_id: RunId,

    /// Run that was corrected
    pub parent_run_id: RunId,

    /// Members of each group after the move
    pub groups: BTreeMap<GroupId, Vec<MemberId>>,

    /// Whether group sizes still lie within one of each other
    pub balanced: bool,

    /// Findings from rebuilding the parent run's graph
    pub diagnostics: GraphDiagnostics,
}

/// Preservation, centrality and profiles of a stored run
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// Run analyzed
    pub run: Run,

    /// Preservation and centrality
    pub report: PreservationReport,

    /// Per-group profiles
    pub profiles: Vec<GroupProfile>,

    /// Findings from rebuilding the graph
    pub diagnostics: GraphDiagnostics,
}
