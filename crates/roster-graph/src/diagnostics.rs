//! Diagnostics recorded while building a graph
//!
//! None of these conditions fail a run. They are surfaced so the caller can
//! tell how far the built graph deviates from the raw snapshot.

use roster_domain::{ErrorKind, MemberId, RelationType};
use std::collections::BTreeMap;

/// Counters and findings from one graph build
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphDiagnostics {
    /// Edges dropped because an endpoint is not a cohort member
    pub dropped_unknown: BTreeMap<RelationType, usize>,

    /// Self-nominations dropped
    pub self_loops: BTreeMap<RelationType, usize>,

    /// Repeated edges collapsed
    pub duplicate_edges: BTreeMap<RelationType, usize>,

    /// Member rows ignored because their id was already seen
    pub duplicate_members: usize,

    /// Present but non-numeric cells replaced by the missing value
    pub coerced_values: usize,

    /// Absent cells replaced by the missing value
    pub missing_values: usize,

    /// Relation type pairs with identical non-empty edge sets
    pub aliased_relations: Vec<(RelationType, RelationType)>,

    /// Cohort members left out because a stored assignment does not cover them
    pub unassigned_members: Vec<MemberId>,

    /// Members of a stored assignment that are no longer in the cohort
    pub missing_members: Vec<MemberId>,
}

impl GraphDiagnostics {
    /// Create empty diagnostics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edge dropped for an unknown endpoint
    pub fn record_unknown_endpoint(&mut self, relation: RelationType) {
        *self.dropped_unknown.entry(relation).or_insert(0) += 1;
    }

    /// Record a dropped self-nomination
    pub fn record_self_loop(&mut self, relation: RelationType) {
        *self.self_loops.entry(relation).or_insert(0) += 1;
    }

    /// Record a collapsed duplicate edge
    pub fn record_duplicate_edge(&mut self, relation: RelationType) {
        *self.duplicate_edges.entry(relation).or_insert(0) += 1;
    }

    /// Total edges dropped for unknown endpoints
    pub fn total_dropped_unknown(&self) -> usize {
        self.dropped_unknown.values().sum()
    }

    /// Total self-nominations dropped
    pub fn total_self_loops(&self) -> usize {
        self.self_loops.values().sum()
    }

    /// Total duplicate edges collapsed
    pub fn total_duplicate_edges(&self) -> usize {
        self.duplicate_edges.values().sum()
    }

    /// Whether the run should carry a partial-graph diagnostic
    pub fn is_partial(&self) -> bool {
        self.total_dropped_unknown() > 0
            || !self.aliased_relations.is_empty()
            || !self.unassigned_members.is_empty()
            || !self.missing_members.is_empty()
    }

    /// Error kind attached to the diagnostics, if any
    pub fn kind(&self) -> Option<ErrorKind> {
        self.is_partial().then_some(ErrorKind::PartialGraph)
    }

    /// Human-readable findings, one per line
    pub fn messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        for (relation, count) in &self.dropped_unknown {
            messages.push(format!(
                "dropped {} {} edge(s) with unknown endpoints",
                count, relation
            ));
        }
        for (a, b) in &self.aliased_relations {
            messages.push(format!("relation types {} and {} have identical edge sets", a, b));
        }
        if !self.unassigned_members.is_empty() {
            messages.push(format!(
                "{} member(s) not covered by the run were left out: {}",
                self.unassigned_members.len(),
                join_ids(&self.unassigned_members)
            ));
        }
        if !self.missing_members.is_empty() {
            messages.push(format!(
                "{} assigned member(s) are no longer in the cohort: {}",
                self.missing_members.len(),
                join_ids(&self.missing_members)
            ));
        }
        messages
    }

    /// Get a summary string
    pub fn summary(&self) -> String {
        let mut summary = String::from("Graph Diagnostics:\n");
        summary.push_str(&format!(
            "  Dropped (unknown endpoint): {}\n",
            self.total_dropped_unknown()
        ));
        summary.push_str(&format!("  Self-nominations: {}\n", self.total_self_loops()));
        summary.push_str(&format!("  Duplicate edges: {}\n", self.total_duplicate_edges()));
        summary.push_str(&format!("  Duplicate members: {}\n", self.duplicate_members));
        summary.push_str(&format!(
            "  Coerced/missing values: {}/{}\n",
            self.coerced_values, self.missing_values
        ));
        if !self.aliased_relations.is_empty() {
            let pairs: Vec<String> = self
                .aliased_relations
                .iter()
                .map(|(a, b)| format!("{}={}", a, b))
                .collect();
            summary.push_str(&format!("  Aliased relations: {}\n", pairs.join(", ")));
        }
        if !self.unassigned_members.is_empty() || !self.missing_members.is_empty() {
            summary.push_str(&format!(
                "  Unassigned/missing members: {}/{}\n",
                self.unassigned_members.len(),
                self.missing_members.len()
            ));
        }
        summary
    }
}

fn join_ids(ids: &[MemberId]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
