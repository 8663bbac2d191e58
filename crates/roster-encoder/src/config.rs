//! Configuration for the graph encoder

use serde::{Deserialize, Serialize};

/// Configuration for [`RelationalGraphEncoder`](crate::RelationalGraphEncoder)
///
/// # Examples
///
/// ```
/// use roster_encoder::EncoderConfig;
///
/// let config = EncoderConfig::default();
/// assert_eq!(config.embedding_dim, 16);
/// assert_eq!(config.iterations, 200);
///
/// // Fewer iterations and smaller layers
/// let config = EncoderConfig::fast();
/// assert!(config.iterations < 200);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Width of the hidden message-passing layers
    pub hidden_dim: usize,

    /// Length of the final embedding vector
    pub embedding_dim: usize,

    /// Attention heads in the refinement layer (averaged)
    pub attention_heads: usize,

    /// Fixed number of training iterations
    pub iterations: usize,

    /// Gradient step size
    pub learning_rate: f64,

    /// Maximum gradient norm per step
    pub gradient_clip: f64,

    /// Seed for weight initialization
    pub seed: u64,

    /// Slope of the attention LeakyReLU for negative inputs
    #[serde(default = "default_negative_slope")]
    pub negative_slope: f64,
}

fn default_negative_slope() -> f64 {
    0.2
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            hidden_dim: 32,
            embedding_dim: 16,
            attention_heads: 2,
            iterations: 200,
            learning_rate: 0.01,
            gradient_clip: 1.0,
            seed: 42,
            negative_slope: 0.2,
        }
    }
}

impl EncoderConfig {
    /// Small layers, few iterations
    pub fn fast() -> Self {
        Self {
            hidden_dim: 16,
            embedding_dim: 8,
            attention_heads: 1,
            iterations: 50,
            ..Self::default()
        }
    }

    /// Wider layers, more iterations
    pub fn thorough() -> Self {
        Self {
            hidden_dim: 64,
            embedding_dim: 32,
            attention_heads: 4,
            iterations: 500,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.hidden_dim == 0 {
            return Err("hidden_dim must be greater than 0".to_string());
        }
        if self.embedding_dim == 0 {
            return Err("embedding_dim must be greater than 0".to_string());
        }
        if self.attention_heads == 0 {
            return Err("attention_heads must be greater than 0".to_string());
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err("learning_rate must be a positive number".to_string());
        }
        if !(self.gradient_clip.is_finite() && self.gradient_clip > 0.0) {
            return Err("gradient_clip must be a positive number".to_string());
        }
        if !(self.negative_slope.is_finite() && self.negative_slope >= 0.0) {
            return Err("negative_slope must be non-negative".to_string());
        }
        Ok(())
    }

    /// Stable identity of the configuration, used in cache keys
    pub fn cache_key(&self) -> String {
        format!(
            "h{}-e{}-a{}-i{}-lr{}-c{}-s{}-ns{}",
            self.hidden_dim,
            self.embedding_dim,
            self.attention_heads,
            self.iterations,
            self.learning_rate,
            self.gradient_clip,
            self.seed,
            self.negative_slope
        )
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
