//! The validated cohort graph handed to the encoder and allocator

use roster_domain::{Member, MemberId, Polarity, RelationType, RelationshipEdge};
use std::collections::{BTreeMap, HashMap};

/// Normalized, validated cohort graph
///
/// Members are indexed `0..n` in ascending id order. Edges are stored per
/// relation type as index pairs and only reference known members.
#[derive(Debug, Clone)]
pub struct CohortGraph {
    pub(crate) cohort: String,
    pub(crate) members: Vec<Member>,
    pub(crate) index: HashMap<MemberId, usize>,
    pub(crate) feature_names: Vec<String>,
    pub(crate) features: Vec<Vec<f64>>,
    pub(crate) edges: BTreeMap<RelationType, Vec<(usize, usize)>>,
    pub(crate) missing_value: f64,
    pub(crate) fingerprint: String,
}

impl CohortGraph {
    /// Cohort this graph was built from
    pub fn cohort(&self) -> &str {
        &self.cohort
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the graph has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in index order
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Member ids in index order
    pub fn member_ids(&self) -> Vec<MemberId> {
        self.members.iter().map(|m| m.id).collect()
    }

    /// Id of the member at `index`
    pub fn member_id(&self, index: usize) -> Option<MemberId> {
        self.members.get(index).map(|m| m.id)
    }

    /// Index of a member
    pub fn index_of(&self, id: MemberId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Feature column names
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Feature matrix (n × f), standardized unless configured otherwise
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Number of feature columns
    pub fn feature_dim(&self) -> usize {
        self.feature_names.len()
    }

    /// Edges of one relation type as `(source, target)` index pairs
    pub fn edges(&self, relation: RelationType) -> &[(usize, usize)] {
        self.edges.get(&relation).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of edges across all relation types
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Edges of all types with member ids
    pub fn typed_edges(&self) -> Vec<RelationshipEdge> {
        self.edges
            .iter()
            .flat_map(|(relation, pairs)| {
                pairs.iter().map(move |(s, t)| {
                    RelationshipEdge::new(self.members[*s].id, self.members[*t].id, *relation)
                })
            })
            .collect()
    }

    /// Edges of one relation type with member ids
    pub fn relation_edges(&self, relation: RelationType) -> Vec<(MemberId, MemberId)> {
        self.edges(relation)
            .iter()
            .map(|(s, t)| (self.members[*s].id, self.members[*t].id))
            .collect()
    }

    /// Whether any edge of the given polarity exists
    pub fn has_edges_of(&self, polarity: Polarity) -> bool {
        self.edges
            .iter()
            .any(|(relation, pairs)| relation.polarity() == polarity && !pairs.is_empty())
    }

    /// Coerced, unstandardized numeric value of an attribute
    ///
    /// Missing or non-numeric cells yield the configured missing value.
    pub fn raw_value(&self, index: usize, attribute: &str) -> f64 {
        self.members
            .get(index)
            .and_then(|m| m.attribute(attribute).as_number())
            .unwrap_or(self.missing_value)
    }

    /// SHA-256 fingerprint of members, features and edges (hex)
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}
