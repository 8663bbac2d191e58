//! Member module - cohort members and their raw attributes

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Well-known attribute names carried by cohort snapshots
pub mod attributes {
    /// Academic performance percentage
    pub const ACADEMIC: &str = "perc_academic";
    /// Effort percentage
    pub const EFFORT: &str = "perc_effort";
    /// Attendance percentage
    pub const ATTENDANCE: &str = "attendance";
    /// Completed years at the school
    pub const TENURE_YEARS: &str = "complete_years";
    /// Categorical house code
    pub const HOUSE: &str = "house";
}

/// Stable identifier of a cohort member
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemberId(u64);

impl MemberId {
    /// Create a member id from its raw value
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for MemberId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MemberId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| format!("Invalid member id '{}': {}", s, e))
    }
}

/// Raw attribute value as delivered by the data source
///
/// Sources are loosely typed: numbers can arrive as text and cells can be
/// empty. Coercion happens in the graph builder, never here.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Numeric cell
    Number(f64),

    /// Text cell (may still hold a number)
    Text(String),

    /// Empty or null cell
    Missing,
}

impl AttributeValue {
    /// Numeric view of the value
    ///
    /// Numbers are returned as-is, numeric-looking text is parsed.
    /// Non-finite values are treated as absent.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            AttributeValue::Number(n) => *n,
            AttributeValue::Text(s) => s.trim().parse::<f64>().ok()?,
            AttributeValue::Missing => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Categorical view of the value (trimmed, never empty)
    pub fn as_category(&self) -> Option<String> {
        match self {
            AttributeValue::Number(n) if n.is_finite() => Some(n.to_string()),
            AttributeValue::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }

    /// Whether the value is missing
    pub fn is_missing(&self) -> bool {
        matches!(self, AttributeValue::Missing)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

/// A cohort member
///
/// Created from a cohort snapshot query; immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// Unique, stable identifier
    pub id: MemberId,

    /// Cohort tag (e.g., a year group)
    pub cohort: String,

    /// Raw attributes keyed by name
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Member {
    /// Create a member with no attributes
    pub fn new(id: MemberId, cohort: impl Into<String>) -> Self {
        Self {
            id,
            cohort: cohort.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Get an attribute, treating absent keys as missing
    pub fn attribute(&self, name: &str) -> &AttributeValue {
        self.attributes.get(name).unwrap_or(&AttributeValue::Missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_id_parse() {
        assert_eq!("32407".parse::<MemberId>().unwrap(), MemberId::new(32407));
        assert_eq!(" 7 ".parse::<MemberId>().unwrap(), MemberId::new(7));
        assert!("abc".parse::<MemberId>().is_err());
    }

    #[test]
    fn test_attribute_numeric_coercion() {
        assert_eq!(AttributeValue::Number(71.5).as_number(), Some(71.5));
        assert_eq!(AttributeValue::from("  64 ").as_number(), Some(64.0));
        assert_eq!(AttributeValue::from("n/a").as_number(), None);
        assert_eq!(AttributeValue::Number(f64::NAN).as_number(), None);
        assert_eq!(AttributeValue::Missing.as_number(), None);
    }

    #[test]
    fn test_attribute_category() {
        assert_eq!(AttributeValue::from(" Blue ").as_category().as_deref(), Some("Blue"));
        assert_eq!(AttributeValue::from("  ").as_category(), None);
        assert_eq!(AttributeValue::Number(3.0).as_category().as_deref(), Some("3"));
    }

    #[test]
    fn test_member_attribute_lookup() {
        let member = Member::new(MemberId::new(1), "2025")
            .with_attribute(attributes::ACADEMIC, 80.0)
            .with_attribute(attributes::HOUSE, "Red");

        assert_eq!(member.attribute(attributes::ACADEMIC).as_number(), Some(80.0));
        assert!(member.attribute(attributes::EFFORT).is_missing());
    }
}
