//! Configuration for hint clustering and constrained allocation

use roster_domain::member::attributes;
use roster_domain::RelationType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Allocation policy selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Time-boxed combinatorial search over the weighted objective
    Solver,
    /// Attribute-balanced round-robin heuristic
    Greedy,
    /// Seeded shuffle dealt round-robin (comparison baseline)
    Random,
}

impl PolicyKind {
    /// Get the policy label as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::Solver => "solver",
            PolicyKind::Greedy => "greedy",
            PolicyKind::Random => "random",
        }
    }
}

impl Default for PolicyKind {
    fn default() -> Self {
        PolicyKind::Solver
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solver" | "cp" | "optimizer" => Ok(PolicyKind::Solver),
            "greedy" | "balanced" => Ok(PolicyKind::Greedy),
            "random" => Ok(PolicyKind::Random),
            other => Err(format!("Unknown allocation policy: {}", other)),
        }
    }
}

/// Objective weights
///
/// Per-relation overrides are keyed by relation name (`friend`, `advice`,
/// `disrespect`, ...). Separating one antagonistic pair must outweigh keeping
/// any single positive tie, so the negative weight has to exceed every
/// positive weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveWeights {
    /// Reward per member placed in its hinted group
    pub hint: f64,

    /// Reward per positive edge kept inside a group
    pub positive: f64,

    /// Penalty per negative edge kept inside a group
    pub negative: f64,

    /// Per-relation overrides of `positive` / `negative`
    #[serde(default)]
    pub per_relation: BTreeMap<String, f64>,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            hint: 1.0,
            positive: 2.0,
            negative: 5.0,
            per_relation: BTreeMap::new(),
        }
    }
}

impl ObjectiveWeights {
    /// Magnitude of the weight applied to one edge of `relation`
    ///
    /// The sign comes from the relation's polarity.
    pub fn weight_for(&self, relation: RelationType) -> f64 {
        if let Some(w) = self
            .per_relation
            .iter()
            .find(|(name, _)| RelationType::parse(name) == Some(relation))
            .map(|(_, w)| *w)
        {
            return w;
        }
        if relation.is_positive() {
            self.positive
        } else {
            self.negative
        }
    }

    /// Signed contribution of one intra-group edge of `relation`
    pub fn signed_weight(&self, relation: RelationType) -> f64 {
        if relation.is_positive() {
            self.weight_for(relation)
        } else {
            -self.weight_for(relation)
        }
    }

    /// Validate weights
    pub fn validate(&self) -> Result<(), String> {
        for name in self.per_relation.keys() {
            if RelationType::parse(name).is_none() {
                return Err(format!("unknown relation type in weights: {}", name));
            }
        }

        let all = [self.hint, self.positive, self.negative]
            .into_iter()
            .chain(self.per_relation.values().copied());
        for w in all {
            if !w.is_finite() || w < 0.0 {
                return Err(format!("weights must be finite and non-negative, got {}", w));
            }
        }

        let max_positive = RelationType::ALL
            .iter()
            .filter(|r| r.is_positive())
            .map(|r| self.weight_for(*r))
            .fold(0.0, f64::max);
        let min_negative = RelationType::ALL
            .iter()
            .filter(|r| !r.is_positive())
            .map(|r| self.weight_for(*r))
            .fold(f64::INFINITY, f64::min);
        if min_negative <= max_positive {
            return Err(format!(
                "negative weight ({}) must be strictly greater than every positive weight ({})",
                min_negative, max_positive
            ));
        }
        Ok(())
    }
}

/// Configuration for the constrained allocator
///
/// # Examples
///
/// ```
/// use roster_allocator::{AllocatorConfig, PolicyKind};
///
/// let config = AllocatorConfig::default();
/// assert_eq!(config.policy, PolicyKind::Solver);
/// assert_eq!(config.time_budget_secs, 60);
///
/// let config = AllocatorConfig::fast();
/// assert!(config.time_budget_secs < 60);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocatorConfig {
    /// Allocation policy
    #[serde(default)]
    pub policy: PolicyKind,

    /// Objective weights
    #[serde(default)]
    pub weights: ObjectiveWeights,

    /// Wall-clock budget for the solver (seconds)
    pub time_budget_secs: u64,

    /// Largest cohort solved by exhaustive branch-and-bound
    pub exact_search_limit: usize,

    /// Perturbation restarts after the first local optimum
    pub local_search_rounds: usize,

    /// Seed for clustering, perturbation and the random policy
    pub seed: u64,

    /// Attribute balanced by the greedy policy
    pub balance_attribute: String,

    /// Attributes averaged per group in run output
    #[serde(default)]
    pub tracked_attributes: Vec<String>,

    /// Maximum Lloyd iterations per clustering restart
    pub hint_iterations: usize,

    /// Clustering restarts (lowest inertia wins)
    pub hint_restarts: usize,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Solver,
            weights: ObjectiveWeights::default(),
            time_budget_secs: 60,
            exact_search_limit: 12,
            local_search_rounds: 50,
            seed: 42,
            balance_attribute: attributes::ACADEMIC.to_string(),
            tracked_attributes: vec![
                attributes::ACADEMIC.to_string(),
                attributes::EFFORT.to_string(),
                attributes::ATTENDANCE.to_string(),
            ],
            hint_iterations: 300,
            hint_restarts: 10,
        }
    }
}

impl AllocatorConfig {
    /// Short budget, local search only
    pub fn fast() -> Self {
        Self {
            time_budget_secs: 5,
            exact_search_limit: 0,
            local_search_rounds: 10,
            hint_restarts: 3,
            ..Self::default()
        }
    }

    /// Long budget, exhaustive search on larger cohorts
    pub fn exhaustive() -> Self {
        Self {
            time_budget_secs: 300,
            exact_search_limit: 16,
            local_search_rounds: 200,
            ..Self::default()
        }
    }

    /// Solver budget as a Duration
    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.weights.validate()?;
        if self.balance_attribute.trim().is_empty() {
            return Err("balance_attribute must not be empty".to_string());
        }
        if self.hint_iterations == 0 {
            return Err("hint_iterations must be greater than 0".to_string());
        }
        if self.hint_restarts == 0 {
            return Err("hint_restarts must be greater than 0".to_string());
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
    fn test_presets_are_valid() {
        assert!(AllocatorConfig::default().validate().is_ok());
        assert!(AllocatorConfig::fast().validate().is_ok());
        assert!(AllocatorConfig::exhaustive().validate().is_ok());
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("solver".parse::<PolicyKind>().unwrap(), PolicyKind::Solver);
        assert_eq!(" Greedy ".parse::<PolicyKind>().unwrap(), PolicyKind::Greedy);
        assert_eq!("random".parse::<PolicyKind>().unwrap(), PolicyKind::Random);
        assert!("annealing".parse::<PolicyKind>().is_err());
    }

    #[test]
    fn test_negative_must_dominate() {
        let weights = ObjectiveWeights {
            negative: 2.0,
            ..ObjectiveWeights::default()
        };
        assert!(weights.validate().is_err());

        let weights = ObjectiveWeights {
            negative: 1.5,
            positive: 1.0,
            ..ObjectiveWeights::default()
        };
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn test_per_relation_override() {
        let mut weights = ObjectiveWeights::default();
        weights.per_relation.insert("friend".to_string(), 4.0);

        assert_eq!(weights.weight_for(RelationType::Friend), 4.0);
        assert_eq!(weights.weight_for(RelationType::Advice), 2.0);
        assert_eq!(weights.signed_weight(RelationType::Disrespect), -5.0);
        assert!(weights.validate().is_ok());

        // A positive override above the negative weight breaks dominance
        weights.per_relation.insert("influence".to_string(), 6.0);
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_negative_weights_rejected() {
        let weights = ObjectiveWeights {
            hint: -1.0,
            ..ObjectiveWeights::default()
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_unknown_relation_override_rejected() {
        let mut weights = ObjectiveWeights::default();
        weights.per_relation.insert("rivalry".to_string(), 1.0);
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = AllocatorConfig::default();
        config.policy = PolicyKind::Greedy;
        config.weights.per_relation.insert("disrespect".to_string(), 8.0);

        let parsed = AllocatorConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }
}
