//! Relationship graph builder
//!
//! Loads a cohort snapshot through a [`CohortSource`] and turns it into a
//! [`CohortGraph`]: coerced and standardized features plus typed edges
//! restricted to known members.

use crate::{CohortGraph, GraphConfig, GraphDiagnostics, GraphError};
use roster_domain::traits::CohortSource;
use roster_domain::{Assignment, Member, MemberId, RelationType, RelationshipEdge};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};

/// Builds validated cohort graphs
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    config: GraphConfig,
}

impl GraphBuilder {
    /// Create a builder with the given configuration
    pub fn new(config: GraphConfig) -> Result<Self, GraphError> {
        config.validate().map_err(GraphError::Config)?;
        Ok(Self { config })
    }

    /// Create a builder with default configuration
    pub fn default_config() -> Self {
        Self {
            config: GraphConfig::default(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Load a cohort snapshot from `source` and build its graph
    ///
    /// One edge query is issued per relation type. Fails only if the source
    /// fails or the cohort has no members.
    pub fn build<S>(
        &self,
        source: &S,
        cohort: &str,
    ) -> Result<(CohortGraph, GraphDiagnostics), GraphError>
    where
        S: CohortSource,
        S::Error: std::fmt::Display,
    {
        let (members, edges) = load_snapshot(source, cohort)?;
        self.build_snapshot(cohort, members, edges)
    }

    /// Rebuild the graph a stored assignment was made over
    ///
    /// Loads the cohort's current snapshot and keeps only the members the
    /// assignment covers, so rows added after the run do not invalidate it.
    /// Members that joined the cohort since, and assigned members no longer
    /// in it, are reported in the diagnostics. Edges touching a member that
    /// joined later count as dropped for an unknown endpoint.
    pub fn build_for_assignment<S>(
        &self,
        source: &S,
        cohort: &str,
        assignment: &Assignment,
    ) -> Result<(CohortGraph, GraphDiagnostics), GraphError>
    where
        S: CohortSource,
        S::Error: std::fmt::Display,
    {
        let (members, edges) = load_snapshot(source, cohort)?;
        let present: HashSet<MemberId> = members.iter().map(|m| m.id).collect();
        let (assigned, unassigned): (Vec<Member>, Vec<Member>) = members
            .into_iter()
            .partition(|m| assignment.group_of(m.id).is_some());

        let mut unassigned_members: Vec<MemberId> = unassigned.iter().map(|m| m.id).collect();
        unassigned_members.sort();
        unassigned_members.dedup();
        let missing_members: Vec<MemberId> = assignment
            .iter()
            .map(|(id, _)| id)
            .filter(|id| !present.contains(id))
            .collect();

        let (graph, mut diagnostics) = self.build_snapshot(cohort, assigned, edges)?;
        if !unassigned_members.is_empty() {
            warn!(cohort, count = unassigned_members.len(), "Members outside the stored assignment were left out");
        }
        if !missing_members.is_empty() {
            warn!(cohort, count = missing_members.len(), "Assigned members are no longer in the cohort");
        }
        diagnostics.unassigned_members = unassigned_members;
        diagnostics.missing_members = missing_members;
        Ok((graph, diagnostics))
    }

    /// Build a graph from an in-memory snapshot
    pub fn build_snapshot(
        &self,
        cohort: &str,
        members: Vec<Member>,
        edges: Vec<RelationshipEdge>,
    ) -> Result<(CohortGraph, GraphDiagnostics), GraphError> {
        if members.is_empty() {
            return Err(GraphError::EmptyCohort(cohort.to_string()));
        }

        let mut diagnostics = GraphDiagnostics::new();
        let members = self.unique_members(members, &mut diagnostics);
        let index: HashMap<MemberId, usize> =
            members.iter().enumerate().map(|(i, m)| (m.id, i)).collect();

        let feature_names = self.config.feature_names();
        let mut features = self.feature_matrix(&members, &mut diagnostics);
        if self.config.standardize {
            standardize_columns(&mut features);
        }

        let typed = self.filter_edges(&index, edges, &mut diagnostics);
        if self.config.check_relation_aliasing {
            diagnostics.aliased_relations = find_aliased_relations(&typed);
            for (a, b) in &diagnostics.aliased_relations {
                warn!(cohort, first = %a, second = %b, "Relation types have identical edge sets");
            }
        }

        let fingerprint = fingerprint(cohort, &members, &feature_names, &features, &typed);

        info!(
            cohort,
            members = members.len(),
            edges = typed.values().map(Vec::len).sum::<usize>(),
            dropped = diagnostics.total_dropped_unknown(),
            "Built cohort graph"
        );

        let graph = CohortGraph {
            cohort: cohort.to_string(),
            members,
            index,
            feature_names,
            features,
            edges: typed,
            missing_value: self.config.missing_value,
            fingerprint,
        };
        Ok((graph, diagnostics))
    }

    fn unique_members(&self, mut members: Vec<Member>, diagnostics: &mut GraphDiagnostics) -> Vec<Member> {
        members.sort_by_key(|m| m.id);
        let before = members.len();
        members.dedup_by_key(|m| m.id);
        diagnostics.duplicate_members = before - members.len();
        if diagnostics.duplicate_members > 0 {
            warn!(count = diagnostics.duplicate_members, "Ignored duplicate member rows");
        }
        members
    }

    fn feature_matrix(&self, members: &[Member], diagnostics: &mut GraphDiagnostics) -> Vec<Vec<f64>> {
        let missing = self.config.missing_value;
        let mut rows = vec![Vec::with_capacity(self.config.feature_names().len()); members.len()];

        for name in &self.config.numeric_attributes {
            let mut coerced = 0usize;
            for (row, member) in rows.iter_mut().zip(members) {
                let cell = member.attribute(name);
                let value = match cell.as_number() {
                    Some(v) => v,
                    None if cell.is_missing() => {
                        diagnostics.missing_values += 1;
                        missing
                    }
                    None => {
                        coerced += 1;
                        missing
                    }
                };
                row.push(value);
            }
            if coerced > 0 {
                warn!(attribute = %name, count = coerced, "Coerced non-numeric attribute values");
                diagnostics.coerced_values += coerced;
            }
        }

        for name in &self.config.categorical_attributes {
            // Codes follow the sorted order of distinct values
            let categories: BTreeSet<String> = members
                .iter()
                .filter_map(|m| m.attribute(name).as_category())
                .collect();
            let codes: HashMap<&str, f64> = categories
                .iter()
                .enumerate()
                .map(|(code, value)| (value.as_str(), code as f64))
                .collect();

            for (row, member) in rows.iter_mut().zip(members) {
                let value = match member.attribute(name).as_category() {
                    Some(category) => codes.get(category.as_str()).copied().unwrap_or(missing),
                    None => {
                        diagnostics.missing_values += 1;
                        missing
                    }
                };
                row.push(value);
            }
        }

        rows
    }

    fn filter_edges(
        &self,
        index: &HashMap<MemberId, usize>,
        edges: Vec<RelationshipEdge>,
        diagnostics: &mut GraphDiagnostics,
    ) -> BTreeMap<RelationType, Vec<(usize, usize)>> {
        let mut typed: BTreeMap<RelationType, Vec<(usize, usize)>> =
            RelationType::ALL.iter().map(|r| (*r, Vec::new())).collect();
        let mut seen: HashSet<(RelationType, usize, usize)> = HashSet::new();

        for edge in edges {
            let (Some(&source), Some(&target)) = (index.get(&edge.source), index.get(&edge.target))
            else {
                diagnostics.record_unknown_endpoint(edge.relation);
                continue;
            };
            if self.config.drop_self_loops && source == target {
                diagnostics.record_self_loop(edge.relation);
                continue;
            }
            if self.config.dedupe_edges && !seen.insert((edge.relation, source, target)) {
                diagnostics.record_duplicate_edge(edge.relation);
                continue;
            }
            typed.entry(edge.relation).or_default().push((source, target));
        }

        for (relation, count) in &diagnostics.dropped_unknown {
            warn!(relation = %relation, count, "Dropped edges with unknown endpoints");
        }
        for (relation, count) in &diagnostics.self_loops {
            warn!(relation = %relation, count, "Dropped self-nominations");
        }
        for (relation, count) in &diagnostics.duplicate_edges {
            warn!(relation = %relation, count, "Collapsed duplicate edges");
        }

        typed
    }
}

/// Members and typed edges of one cohort, one edge query per relation type
fn load_snapshot<S>(source: &S, cohort: &str) -> Result<(Vec<Member>, Vec<RelationshipEdge>), GraphError>
where
    S: CohortSource,
    S::Error: std::fmt::Display,
{
    let members = source
        .get_members(cohort)
        .map_err(|e| GraphError::Source(e.to_string()))?;
    if members.is_empty() {
        return Err(GraphError::EmptyCohort(cohort.to_string()));
    }

    let mut edges = Vec::new();
    for relation in RelationType::ALL {
        let pairs = source
            .get_relationship_edges(relation, cohort)
            .map_err(|e| GraphError::Source(e.to_string()))?;
        debug!(cohort, relation = %relation, edges = pairs.len(), "Loaded relationship edges");
        edges.extend(
            pairs
                .into_iter()
                .map(|(s, t)| RelationshipEdge::new(s, t, relation)),
        );
    }
    Ok((members, edges))
}

/// Standardize each column to zero mean and unit (population) variance
///
/// Constant columns become all zeros.
pub fn standardize_columns(rows: &mut [Vec<f64>]) {
    let n = rows.len();
    if n == 0 {
        return;
    }
    let dim = rows[0].len();
    for col in 0..dim {
        let mean = rows.iter().map(|r| r[col]).sum::<f64>() / n as f64;
        let variance = rows.iter().map(|r| (r[col] - mean).powi(2)).sum::<f64>() / n as f64;
        let std = variance.sqrt();
        for row in rows.iter_mut() {
            row[col] = if std > 1e-12 { (row[col] - mean) / std } else { 0.0 };
        }
    }
}

fn find_aliased_relations(
    typed: &BTreeMap<RelationType, Vec<(usize, usize)>>,
) -> Vec<(RelationType, RelationType)> {
    let sets: Vec<(RelationType, BTreeSet<(usize, usize)>)> = typed
        .iter()
        .filter(|(_, pairs)| !pairs.is_empty())
        .map(|(relation, pairs)| (*relation, pairs.iter().copied().collect()))
        .collect();

    let mut aliased = Vec::new();
    for (i, (a, set_a)) in sets.iter().enumerate() {
        for (b, set_b) in &sets[i + 1..] {
            if set_a == set_b {
                aliased.push((*a, *b));
            }
        }
    }
    aliased
}

fn fingerprint(
    cohort: &str,
    members: &[Member],
    feature_names: &[String],
    features: &[Vec<f64>],
    typed: &BTreeMap<RelationType, Vec<(usize, usize)>>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(cohort.as_bytes());
    hasher.update((members.len() as u64).to_le_bytes());
    for member in members {
        hasher.update(member.id.value().to_le_bytes());
    }
    for name in feature_names {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
    }
    for row in features {
        for value in row {
            hasher.update(value.to_bits().to_le_bytes());
        }
    }
    for (relation, pairs) in typed {
        hasher.update(relation.as_str().as_bytes());
        hasher.update((pairs.len() as u64).to_le_bytes());
        for (s, t) in pairs {
            hasher.update((*s as u64).to_le_bytes());
            hasher.update((*t as u64).to_le_bytes());
        }
    }
    hex::encode(hasher.finalize())
}
