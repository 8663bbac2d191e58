//! Configuration for graph construction

use roster_domain::member::attributes;
use serde::{Deserialize, Serialize};

/// Configuration for the relationship graph builder
///
/// # Examples
///
/// ```
/// use roster_graph::GraphConfig;
///
/// let config = GraphConfig::default();
/// assert_eq!(config.numeric_attributes.len(), 4);
/// assert!(config.standardize);
///
/// // Raw features, useful when inspecting coerced values
/// let config = GraphConfig::raw();
/// assert!(!config.standardize);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Numeric attributes turned into feature columns
    pub numeric_attributes: Vec<String>,

    /// Categorical attributes encoded as small integer codes
    #[serde(default)]
    pub categorical_attributes: Vec<String>,

    /// Value substituted for missing or non-numeric cells
    /// Default: 0.0
    #[serde(default)]
    pub missing_value: f64,

    /// Standardize feature columns to zero mean, unit variance
    /// Default: true
    #[serde(default = "default_true")]
    pub standardize: bool,

    /// Drop edges whose source and target are the same member
    #[serde(default = "default_true")]
    pub drop_self_loops: bool,

    /// Collapse repeated edges of the same type into one
    #[serde(default = "default_true")]
    pub dedupe_edges: bool,

    /// Warn when two relation types carry identical edge sets
    #[serde(default = "default_true")]
    pub check_relation_aliasing: bool,
}

fn default_true() -> bool {
    true
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            numeric_attributes: vec![
                attributes::ACADEMIC.to_string(),
                attributes::EFFORT.to_string(),
                attributes::ATTENDANCE.to_string(),
                attributes::TENURE_YEARS.to_string(),
            ],
            categorical_attributes: vec![attributes::HOUSE.to_string()],
            missing_value: 0.0,
            standardize: true,
            drop_self_loops: true,
            dedupe_edges: true,
            check_relation_aliasing: true,
        }
    }
}

impl GraphConfig {
    /// Same attribute set as the default, without standardization
    pub fn raw() -> Self {
        Self {
            standardize: false,
            ..Self::default()
        }
    }

    /// Names of all feature columns, numeric first
    pub fn feature_names(&self) -> Vec<String> {
        self.numeric_attributes
            .iter()
            .chain(self.categorical_attributes.iter())
            .cloned()
            .collect()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let names = self.feature_names();
        if names.is_empty() {
            return Err("at least one feature attribute is required".to_string());
        }
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err("attribute names must not be empty".to_string());
        }
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        if sorted.len() != names.len() {
            return Err("attribute names must be unique".to_string());
        }
        if !self.missing_value.is_finite() {
            return Err("missing_value must be finite".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GraphConfig::default().validate().is_ok());
        assert!(GraphConfig::raw().validate().is_ok());
    }

    #[test]
    fn test_feature_names_order() {
        let config = GraphConfig::default();
        let names = config.feature_names();
        assert_eq!(names.first().map(String::as_str), Some(attributes::ACADEMIC));
        assert_eq!(names.last().map(String::as_str), Some(attributes::HOUSE));
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        let mut config = GraphConfig::default();
        config.categorical_attributes.push(attributes::ACADEMIC.to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_no_attributes_rejected() {
        let config = GraphConfig {
            numeric_attributes: vec![],
            categorical_attributes: vec![],
            ..GraphConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = GraphConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = GraphConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = GraphConfig::from_toml("numeric_attributes = [\"perc_academic\"]").unwrap();
        assert!(parsed.standardize);
        assert!(parsed.categorical_attributes.is_empty());
        assert_eq!(parsed.missing_value, 0.0);
    }
}
