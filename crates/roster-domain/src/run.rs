//! Run module - immutable, append-only pipeline executions

use crate::{Assignment, GroupId, IntraGroupEdge, MemberId, PreservationRecord};
use std::collections::BTreeMap;
use std::fmt;

/// Unique identifier for a run based on UUIDv7
///
/// UUIDv7 gives chronologically sortable ids, so "latest run" is simply the
/// maximum id, and ids can be generated by concurrent workers without
/// coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(u128);

impl RunId {
    /// Generate a new UUIDv7-based RunId
    ///
    /// # Examples
    ///
    /// ```
    /// use roster_domain::RunId;
    ///
    /// let id = RunId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a RunId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a RunId from a UUID string
    ///
    /// # Examples
    ///
    /// ```
    /// use roster_domain::RunId;
    ///
    /// let id = RunId::new();
    /// let parsed = RunId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s.trim())
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid run id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Timestamp component of the UUIDv7 (milliseconds since Unix epoch)
    pub fn timestamp(&self) -> u64 {
        // UUIDv7: top 48 bits are Unix millisecond timestamp
        (self.0 >> 80) as u64
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl std::str::FromStr for RunId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

/// Lifecycle stage of a run
///
/// ```text
/// CREATED → GRAPH_BUILT → EMBEDDED → HINTED → ALLOCATED → ANALYZED → PERSISTED
/// ```
///
/// A reallocation enters with a ready-made assignment and jumps from
/// `Created` straight to `Allocated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RunStage {
    /// Run record exists, nothing computed
    Created,
    /// Graph built from a fresh cohort snapshot
    GraphBuilt,
    /// Member embeddings computed
    Embedded,
    /// Preferred-group hints computed
    Hinted,
    /// Final assignment available
    Allocated,
    /// Preservation and centrality computed
    Analyzed,
    /// Output committed to the sink
    Persisted,
}

impl RunStage {
    /// Get the stage name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStage::Created => "created",
            RunStage::GraphBuilt => "graph_built",
            RunStage::Embedded => "embedded",
            RunStage::Hinted => "hinted",
            RunStage::Allocated => "allocated",
            RunStage::Analyzed => "analyzed",
            RunStage::Persisted => "persisted",
        }
    }

    /// Next stage of the regular pipeline
    pub fn next(&self) -> Option<Self> {
        match self {
            RunStage::Created => Some(RunStage::GraphBuilt),
            RunStage::GraphBuilt => Some(RunStage::Embedded),
            RunStage::Embedded => Some(RunStage::Hinted),
            RunStage::Hinted => Some(RunStage::Allocated),
            RunStage::Allocated => Some(RunStage::Analyzed),
            RunStage::Analyzed => Some(RunStage::Persisted),
            RunStage::Persisted => None,
        }
    }

    /// Whether `to` is a legal transition from this stage
    pub fn can_advance_to(&self, to: RunStage) -> bool {
        self.next() == Some(to) || (*self == RunStage::Created && to == RunStage::Allocated)
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Illegal stage transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageError {
    /// Current stage
    pub from: RunStage,
    /// Requested stage
    pub to: RunStage,
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal run stage transition {} -> {}", self.from, self.to)
    }
}

impl std::error::Error for StageError {}

/// Policy label used for manual reallocation runs
pub const MANUAL_POLICY: &str = "manual";

/// An allocation run
///
/// Runs are append-only: a correction produces a new run that points back
/// at its parent, never an in-place mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    /// Unique identifier
    pub id: RunId,

    /// Cohort processed by this run
    pub cohort: String,

    /// Creation time (milliseconds since Unix epoch)
    pub created_at: u64,

    /// Target group count k
    pub group_count: usize,

    /// Allocation policy label (`solver`, `greedy`, `random`, `manual`)
    pub policy: String,

    /// Run this one was derived from (reallocations only)
    pub parent: Option<RunId>,

    stage: RunStage,
}

impl Run {
    /// Create a fresh run in the `Created` stage
    pub fn new(cohort: impl Into<String>, group_count: usize, policy: impl Into<String>) -> Self {
        let id = RunId::new();
        Self {
            id,
            cohort: cohort.into(),
            created_at: id.timestamp(),
            group_count,
            policy: policy.into(),
            parent: None,
            stage: RunStage::Created,
        }
    }

    /// Create a manual reallocation run derived from `parent`
    pub fn derived_from(parent: &Run) -> Self {
        let mut run = Self::new(parent.cohort.clone(), parent.group_count, MANUAL_POLICY);
        run.parent = Some(parent.id);
        run
    }

    /// Rebuild a persisted run from storage
    pub fn restore(
        id: RunId,
        cohort: String,
        created_at: u64,
        group_count: usize,
        policy: String,
        parent: Option<RunId>,
    ) -> Self {
        Self {
            id,
            cohort,
            created_at,
            group_count,
            policy,
            parent,
            stage: RunStage::Persisted,
        }
    }

    /// Current lifecycle stage
    pub fn stage(&self) -> RunStage {
        self.stage
    }

    /// Advance the lifecycle, rejecting illegal transitions
    pub fn advance(&mut self, to: RunStage) -> Result<(), StageError> {
        if !self.stage.can_advance_to(to) {
            return Err(StageError { from: self.stage, to });
        }
        self.stage = to;
        Ok(())
    }
}

/// Complete output of a run, written to the sink in one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    /// Run metadata
    pub run: Run,

    /// Final assignment
    pub assignment: Assignment,

    /// Preservation rows (per group, per relation type)
    pub preservation: Vec<PreservationRecord>,

    /// Relationship edges kept inside a group
    pub intra_group_edges: Vec<IntraGroupEdge>,

    /// Per-group means of tracked auxiliary attributes
    pub group_averages: BTreeMap<GroupId, BTreeMap<String, f64>>,
}

impl RunRecord {
    /// Assignment rows `(run_id, group_id, member_id)`
    pub fn assignment_rows(&self) -> Vec<(RunId, GroupId, MemberId)> {
        self.assignment
            .iter()
            .map(|(member, group)| (self.run.id, group, member))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_chronological() {
        let id1 = RunId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = RunId::new();

        assert!(id1 < id2, "Earlier UUIDv7 should be less than later UUIDv7");
        assert!(id1.timestamp() <= id2.timestamp());
    }

    #[test]
    fn test_run_id_invalid_string() {
        assert!(RunId::from_string("not-a-run").is_err());
        assert!(RunId::from_string("").is_err());
    }

    #[test]
    fn test_regular_lifecycle() {
        let mut run = Run::new("2025", 4, "solver");
        let stages = [
            RunStage::GraphBuilt,
            RunStage::Embedded,
            RunStage::Hinted,
            RunStage::Allocated,
            RunStage::Analyzed,
            RunStage::Persisted,
        ];
        for stage in stages {
            run.advance(stage).unwrap();
        }
        assert_eq!(run.stage(), RunStage::Persisted);
        assert!(RunStage::Persisted.next().is_none());
    }

    #[test]
    fn test_illegal_transition() {
        let mut run = Run::new("2025", 4, "solver");
        let err = run.advance(RunStage::Analyzed).unwrap_err();
        assert_eq!(err.from, RunStage::Created);
        assert_eq!(run.stage(), RunStage::Created);
        assert!(err.to_string().contains("created -> analyzed"));
    }

    #[test]
    fn test_reallocation_shortcut() {
        let parent = Run::new("2025", 3, "greedy");
        let mut child = Run::derived_from(&parent);

        assert_eq!(child.parent, Some(parent.id));
        assert_eq!(child.policy, MANUAL_POLICY);
        assert_eq!(child.group_count, 3);
        child.advance(RunStage::Allocated).unwrap();
        child.advance(RunStage::Analyzed).unwrap();
    }

    #[test]
    fn test_created_at_matches_id() {
        let run = Run::new("2025", 2, "random");
        assert_eq!(run.created_at, run.id.timestamp());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: UUIDv7 ordering matches u128 ordering
        #[test]
        fn test_run_id_ordering_property(a: u128, b: u128) {
            let id_a = RunId::from_value(a);
            let id_b = RunId::from_value(b);

            prop_assert_eq!(id_a < id_b, a < b);
            prop_assert_eq!(id_a == id_b, a == b);
        }

        /// Property: Round-trip through string representation preserves the id
        #[test]
        fn test_run_id_string_roundtrip(value: u128) {
            let id = RunId::from_value(value);

            match RunId::from_string(&id.to_string()) {
                Ok(parsed) => prop_assert_eq!(id, parsed),
                Err(e) => return Err(TestCaseError::fail(e)),
            }
        }
    }
}
