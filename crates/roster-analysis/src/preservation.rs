//! Relationship preservation for a finished assignment

use crate::centrality::{summarize, CentralitySummary};
use crate::{AnalysisConfig, AnalysisError};
use roster_domain::preservation::percentage;
use roster_domain::{Assignment, GroupId, IntraGroupEdge, MemberId, PreservationRecord, RelationType};
use roster_graph::CohortGraph;
use std::collections::BTreeMap;
use tracing::debug;

/// Cohort-wide preservation of one relation type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelationPreservation {
    /// Relation type
    pub relation: RelationType,

    /// Edges with both endpoints in the same group
    pub preserved: usize,

    /// All edges of this type
    pub total: usize,
}

impl RelationPreservation {
    /// Percentage of edges preserved
    pub fn percentage(&self) -> f64 {
        percentage(self.preserved, self.total)
    }
}

/// Everything recomputed for one assignment
#[derive(Debug, Clone, PartialEq)]
pub struct PreservationReport {
    /// Cohort-wide preservation, one entry per relation type
    pub relations: Vec<RelationPreservation>,

    /// Per group, per relation type; groups in id order
    pub records: Vec<PreservationRecord>,

    /// Edges kept inside a group
    pub intra_group_edges: Vec<IntraGroupEdge>,

    /// Network size and centrality over the whole cohort, per relation type
    pub global_centrality: BTreeMap<RelationType, CentralitySummary>,

    /// Network size and centrality within each group's induced subgraph
    pub group_centrality: BTreeMap<GroupId, BTreeMap<RelationType, CentralitySummary>>,
}

impl PreservationReport {
    /// Record for one group and relation type
    pub fn record(&self, group: GroupId, relation: RelationType) -> Option<&PreservationRecord> {
        self.records
            .iter()
            .find(|r| r.group == group && r.relation == relation)
    }

    /// Cohort-wide preservation of one relation type
    pub fn relation(&self, relation: RelationType) -> Option<&RelationPreservation> {
        self.relations.iter().find(|r| r.relation == relation)
    }
}

/// Recomputes preservation and centrality from scratch
///
/// A group's scope for a relation type is every edge of that type whose
/// source is in the group; the edge is preserved when its target is too.
#[derive(Debug, Clone)]
pub struct PreservationAnalyzer {
    config: AnalysisConfig,
}

impl PreservationAnalyzer {
    /// Create an analyzer
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate().map_err(AnalysisError::Config)?;
        Ok(Self { config })
    }

    /// Create an analyzer with the default configuration
    pub fn default_config() -> Self {
        Self {
            config: AnalysisConfig::default(),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze `assignment` against the typed edges of `graph`
    ///
    /// Every member of `graph` must be assigned.
    pub fn analyze(
        &self,
        graph: &CohortGraph,
        assignment: &Assignment,
    ) -> Result<PreservationReport, AnalysisError> {
        let groups = member_groups(graph, assignment)?;
        let group_ids: Vec<GroupId> = (0..assignment.group_count()).map(GroupId::from_index).collect();

        let mut relations = Vec::with_capacity(RelationType::COUNT);
        let mut records = Vec::with_capacity(group_ids.len() * RelationType::COUNT);
        let mut intra_group_edges = Vec::new();
        let mut global_centrality = BTreeMap::new();
        let mut induced: BTreeMap<GroupId, BTreeMap<RelationType, Vec<(MemberId, MemberId)>>> =
            BTreeMap::new();

        for relation in RelationType::ALL {
            let pairs = graph.edges(relation);
            let mut scope: BTreeMap<GroupId, (usize, usize)> =
                group_ids.iter().map(|g| (*g, (0, 0))).collect();
            let mut preserved_total = 0;

            for &(s, t) in pairs {
                let (gs, gt) = (groups[s], groups[t]);
                let entry = scope.entry(gs).or_default();
                entry.1 += 1;
                if gs == gt {
                    entry.0 += 1;
                    preserved_total += 1;
                    let (source, target) = (member_id(graph, s), member_id(graph, t));
                    intra_group_edges.push(IntraGroupEdge {
                        relation,
                        group: gs,
                        source,
                        target,
                    });
                    induced
                        .entry(gs)
                        .or_default()
                        .entry(relation)
                        .or_default()
                        .push((source, target));
                }
            }

            relations.push(RelationPreservation {
                relation,
                preserved: preserved_total,
                total: pairs.len(),
            });
            records.extend(
                scope
                    .into_iter()
                    .map(|(group, (preserved, total))| PreservationRecord::new(group, relation, preserved, total)),
            );
            global_centrality.insert(
                relation,
                summarize(&graph.relation_edges(relation), self.config.top_n),
            );
        }
        records.sort_by_key(|r| (r.group, r.relation));

        let group_centrality = group_ids
            .iter()
            .map(|g| {
                let per_relation = RelationType::ALL
                    .iter()
                    .map(|r| {
                        let edges = induced
                            .get(g)
                            .and_then(|m| m.get(r))
                            .map(Vec::as_slice)
                            .unwrap_or(&[]);
                        (*r, summarize(edges, self.config.top_n))
                    })
                    .collect();
                (*g, per_relation)
            })
            .collect();

        debug!(
            cohort = graph.cohort(),
            groups = group_ids.len(),
            intra_group_edges = intra_group_edges.len(),
            "Preservation analysis complete"
        );
        Ok(PreservationReport {
            relations,
            records,
            intra_group_edges,
            global_centrality,
            group_centrality,
        })
    }
}

/// Group of every graph member, in graph index order
pub(crate) fn member_groups(
    graph: &CohortGraph,
    assignment: &Assignment,
) -> Result<Vec<GroupId>, AnalysisError> {
    graph
        .members()
        .iter()
        .map(|m| assignment.group_of(m.id).ok_or(AnalysisError::Unassigned(m.id)))
        .collect()
}

fn member_id(graph: &CohortGraph, index: usize) -> MemberId {
    graph.members()[index].id
}
