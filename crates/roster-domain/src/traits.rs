//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the allocation core and its
//! collaborators. There is no global data-access object: every pipeline
//! stage receives an implementation of these traits as a parameter.

use crate::{Member, MemberId, RelationType, Run, RunId, RunRecord};

/// Read-only access to cohort snapshots
///
/// Implemented by the infrastructure layer (roster-store)
pub trait CohortSource {
    /// Error type for source operations
    type Error;

    /// All members of a cohort
    fn get_members(&self, cohort: &str) -> Result<Vec<Member>, Self::Error>;

    /// Edges `(source, target)` of one relation type touching the cohort
    ///
    /// Edges may reference members outside the cohort; the graph builder
    /// drops those and records them in its diagnostics.
    fn get_relationship_edges(
        &self,
        relation: RelationType,
        cohort: &str,
    ) -> Result<Vec<(MemberId, MemberId)>, Self::Error>;
}

/// Persistence sink for finished runs
///
/// Implemented by the infrastructure layer (roster-store)
pub trait RunSink {
    /// Error type for sink operations
    type Error;

    /// Persist a complete run atomically: all rows or none
    fn persist_run(&mut self, record: &RunRecord) -> Result<(), Self::Error>;

    /// Load a persisted run with all of its rows
    fn load_run(&self, id: RunId) -> Result<Option<RunRecord>, Self::Error>;

    /// List runs, newest first
    fn list_runs(&self, query: &RunQuery) -> Result<Vec<Run>, Self::Error>;

    /// Most recent run, optionally restricted to a cohort
    fn latest_run(&self, cohort: Option<&str>) -> Result<Option<Run>, Self::Error> {
        let query = RunQuery {
            cohort: cohort.map(str::to_string),
            limit: Some(1),
        };
        Ok(self.list_runs(&query)?.into_iter().next())
    }
}

/// Query criteria for listing runs
#[derive(Debug, Clone, Default)]
pub struct RunQuery {
    /// Filter by cohort
    pub cohort: Option<String>,

    /// Maximum results to return
    pub limit: Option<usize>,
}
