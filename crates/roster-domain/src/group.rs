//! Group module - canonical group identifiers

use std::fmt;

/// Canonical group identifier, 1-based (`1..=k`)
///
/// Allocators work with 0-based labels internally; `from_index`/`index`
/// convert between the two. String labels such as `Classroom_3` are a
/// presentation concern and are only accepted by [`GroupId::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(u32);

impl GroupId {
    /// Create a group id; `None` for 0
    pub fn new(value: u32) -> Option<Self> {
        (value >= 1).then_some(Self(value))
    }

    /// Group id for a 0-based label
    pub fn from_index(index: usize) -> Self {
        Self(index as u32 + 1)
    }

    /// 0-based label of this group
    pub fn index(&self) -> usize {
        (self.0 - 1) as usize
    }

    /// Raw 1-based value
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Parse a boundary label: `3`, `Classroom_3`, `Group 3`, `group-3`
    pub fn parse(s: &str) -> Option<Self> {
        let digits: String = s
            .trim()
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        digits.parse::<u32>().ok().and_then(Self::new)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for GroupId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid group id: {}", s))
    }
}
