//! Pipeline configuration

use crate::PipelineError;
use roster_allocator::AllocatorConfig;
use roster_analysis::AnalysisConfig;
use roster_encoder::EncoderConfig;
use roster_graph::GraphConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for every pipeline stage
///
/// Missing sections fall back to their defaults, so a TOML file only needs
/// the settings it changes.
///
/// # Examples
///
/// ```
/// use roster_pipeline::PipelineConfig;
///
/// let config = PipelineConfig::from_toml(r#"
///     [allocator]
///     policy = "greedy"
///     time_budget_secs = 10
///     exact_search_limit = 12
///     local_search_rounds = 50
///     seed = 1
///     balance_attribute = "perc_effort"
///     hint_iterations = 100
///     hint_restarts = 3
/// "#).unwrap();
/// assert_eq!(config.allocator.balance_attribute, "perc_effort");
/// assert!(config.cache_embeddings);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Graph construction
    #[serde(default)]
    pub graph: GraphConfig,

    /// Member encoder
    #[serde(default)]
    pub encoder: EncoderConfig,

    /// Hint clustering and allocation
    #[serde(default)]
    pub allocator: AllocatorConfig,

    /// Preservation and centrality analysis
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Reuse embeddings across runs on an unchanged snapshot
    #[serde(default = "default_cache_embeddings")]
    pub cache_embeddings: bool,

    /// Maximum cached snapshots
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_cache_embeddings() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    16
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            graph: GraphConfig::default(),
            encoder: EncoderConfig::default(),
            allocator: AllocatorConfig::default(),
            analysis: AnalysisConfig::default(),
            cache_embeddings: default_cache_embeddings(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl PipelineConfig {
    /// Quick runs: small encoder, local search only
    pub fn fast() -> Self {
        Self {
            encoder: EncoderConfig::fast(),
            allocator: AllocatorConfig::fast(),
            ..Self::default()
        }
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), String> {
        self.graph.validate().map_err(|e| format!("graph: {}", e))?;
        self.encoder.validate().map_err(|e| format!("encoder: {}", e))?;
        self.allocator.validate().map_err(|e| format!("allocator: {}", e))?;
        self.analysis.validate().map_err(|e| format!("analysis: {}", e))?;
        if self.cache_embeddings && self.cache_capacity == 0 {
            return Err("cache_capacity must be greater than 0 when caching".to_string());
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

    /// Load and validate configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&contents).map_err(PipelineError::Config)?;
        config.validate().map_err(PipelineError::Config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_allocator::PolicyKind;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
        assert!(PipelineConfig::fast().validate().is_ok());
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = PipelineConfig::fast();
        config.allocator.policy = PolicyKind::Random;
        config.cache_capacity = 4;

        let parsed = PipelineConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_invalid_section_reported() {
        let mut config = PipelineConfig::default();
        config.allocator.weights.negative = 0.5;
        let err = config.validate().unwrap_err();
        assert!(err.starts_with("allocator:"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cache_embeddings = false\n\n[analysis]\ntop_n = 3").unwrap();

        let config = PipelineConfig::from_file(file.path()).unwrap();
        assert!(!config.cache_embeddings);
        assert_eq!(config.analysis.top_n, 3);
    }

    #[test]
    fn test_from_missing_file() {
        let result = PipelineConfig::from_file("/nonexistent/roster.toml");
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }
}
