//! Preservation module - how many ties of each type survive an allocation

use crate::{GroupId, MemberId, RelationType};

/// Share of `total` represented by `preserved`, as a percentage
///
/// Returns 0 when `total` is 0; always within `[0, 100]`.
pub fn percentage(preserved: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (preserved.min(total) as f64 / total as f64) * 100.0
}

/// Preservation of one relation type within one group
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreservationRecord {
    /// Group the record describes
    pub group: GroupId,

    /// Relation type the record describes
    pub relation: RelationType,

    /// Edges with both endpoints in the group
    pub preserved: usize,

    /// Edges of this type in scope for the group
    pub total: usize,
}

impl PreservationRecord {
    /// Create a new record
    pub fn new(group: GroupId, relation: RelationType, preserved: usize, total: usize) -> Self {
        Self {
            group,
            relation,
            preserved,
            total,
        }
    }

    /// Percentage of in-scope edges that were preserved
    pub fn percentage(&self) -> f64 {
        percentage(self.preserved, self.total)
    }
}

/// A relationship edge whose endpoints ended up in the same group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntraGroupEdge {
    /// Relation type of the edge
    pub relation: RelationType,

    /// Group both endpoints belong to
    pub group: GroupId,

    /// Nominating member
    pub source: MemberId,

    /// Nominated member
    pub target: MemberId,
}
