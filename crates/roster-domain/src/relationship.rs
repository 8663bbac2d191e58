//! Relationship module - typed, directed ties between members

use super::MemberId;
use std::fmt;

/// Polarity of a relation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    /// Tie worth keeping within a group
    Positive,

    /// Antagonistic tie worth separating
    Negative,
}

/// Type of relationship between members
///
/// Five positive categories and one negative one. The discriminant order is
/// the canonical relation index used by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelationType {
    /// Nominated as a friend
    Friend,

    /// Nominated as influential
    Influence,

    /// Nominated as a source of feedback
    Feedback,

    /// Would like to spend more time with
    MoreTime,

    /// Nominated as a source of advice
    Advice,

    /// Reported disrespect
    Disrespect,
}

impl RelationType {
    /// All relation types in canonical order
    pub const ALL: [RelationType; 6] = [
        RelationType::Friend,
        RelationType::Influence,
        RelationType::Feedback,
        RelationType::MoreTime,
        RelationType::Advice,
        RelationType::Disrespect,
    ];

    /// Number of relation types
    pub const COUNT: usize = 6;

    /// Get the relation name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Friend => "friend",
            RelationType::Influence => "influence",
            RelationType::Feedback => "feedback",
            RelationType::MoreTime => "more_time",
            RelationType::Advice => "advice",
            RelationType::Disrespect => "disrespect",
        }
    }

    /// Parse a relation type from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "friend" | "friends" => Some(RelationType::Friend),
            "influence" | "influential" => Some(RelationType::Influence),
            "feedback" => Some(RelationType::Feedback),
            "more_time" | "moretime" => Some(RelationType::MoreTime),
            "advice" => Some(RelationType::Advice),
            "disrespect" => Some(RelationType::Disrespect),
            _ => None,
        }
    }

    /// Polarity of this relation type
    pub fn polarity(&self) -> Polarity {
        match self {
            RelationType::Disrespect => Polarity::Negative,
            _ => Polarity::Positive,
        }
    }

    /// Whether this relation type is positive
    pub fn is_positive(&self) -> bool {
        self.polarity() == Polarity::Positive
    }

    /// Canonical index in `0..COUNT`
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Relation type from its canonical index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid relation type: {}", s))
    }
}

/// A directed relationship edge between two members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationshipEdge {
    /// Nominating member
    pub source: MemberId,

    /// Nominated member
    pub target: MemberId,

    /// Type of relationship
    pub relation: RelationType,
}

impl RelationshipEdge {
    /// Create a new edge
    pub fn new(source: MemberId, target: MemberId, relation: RelationType) -> Self {
        Self {
            source,
            target,
            relation,
        }
    }

    /// Whether the edge points back at its source
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}
