//! Analysis configuration

use serde::{Deserialize, Serialize};

/// Configuration for preservation and network analysis
///
/// # Examples
///
/// ```
/// use roster_analysis::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.top_n, 5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Members reported per centrality ranking
    pub top_n: usize,

    /// Net-score contribution of each intra-group positive tie
    #[serde(default = "default_positive_tie_score")]
    pub positive_tie_score: f64,

    /// Net-score contribution of each intra-group negative tie
    #[serde(default = "default_negative_tie_score")]
    pub negative_tie_score: f64,
}

fn default_positive_tie_score() -> f64 {
    1.0
}

fn default_negative_tie_score() -> f64 {
    -2.0
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            positive_tie_score: default_positive_tie_score(),
            negative_tie_score: default_negative_tie_score(),
        }
    }
}

impl AnalysisConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.top_n == 0 {
            return Err("top_n must be greater than 0".to_string());
        }
        if !self.positive_tie_score.is_finite() || !self.negative_tie_score.is_finite() {
            return Err("tie scores must be finite".to_string());
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
