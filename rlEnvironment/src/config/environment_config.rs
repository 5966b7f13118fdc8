use std::collections::HashMap;
use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::ai::actions::grid_action::ActionKind;
use crate::config::constants::{
    DEFAULT_LAMBDA_FACTOR, DEFAULT_OBSERVATION_HISTORY_LENGTH, DEFAULT_SEED, MAINTENANCE_DURATION,
};
use crate::error::GridError;
use crate::lifecycle::Granularity;
use crate::models::element::{ElementType, LoadFlowType};
use crate::reward::RewardKind;

/// Starting point of a single element's lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementLifecycleConfig {
    pub initial_outage_probability: f64,
    pub initial_remaining_duration: u32,
    pub initial_usage_time: u32,
    pub lambda_factor: f64,
    pub seed: Option<u64>,
}

impl Default for ElementLifecycleConfig {
    fn default() -> Self {
        Self {
            initial_outage_probability: 0.0,
            initial_remaining_duration: 0,
            initial_usage_time: 0,
            lambda_factor: DEFAULT_LAMBDA_FACTOR,
            seed: Some(DEFAULT_SEED),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub enabled: bool,
    pub covered_types: Vec<ElementType>,
    pub maintenance_duration: u32,
    pub defaults: ElementLifecycleConfig,
    pub overrides: HashMap<String, ElementLifecycleConfig>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            covered_types: vec![ElementType::Line],
            maintenance_duration: MAINTENANCE_DURATION,
            defaults: ElementLifecycleConfig::default(),
            overrides: HashMap::new(),
        }
    }
}

impl LifecycleConfig {
    /// Configuration for the `index`-th covered element. Elements without an
    /// override seed get `defaults.seed + index` so handlers never share a stream.
    pub fn element_config(&self, element_id: &str, index: usize) -> ElementLifecycleConfig {
        let mut config = self
            .overrides
            .get(element_id)
            .cloned()
            .unwrap_or_else(|| self.defaults.clone());
        if config.seed.is_none() || !self.overrides.contains_key(element_id) {
            let base = self.defaults.seed.unwrap_or(DEFAULT_SEED);
            config.seed = Some(base.wrapping_add(index as u64));
        }
        config
    }

    pub fn covers(&self, element_type: ElementType) -> bool {
        self.enabled && self.covered_types.contains(&element_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardWeight {
    pub kind: RewardKind,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub network_id: String,
    pub loadflow_type: LoadFlowType,
    pub action_kinds: Vec<ActionKind>,
    pub observation_history_length: usize,
    pub granularity: Granularity,
    pub lifecycle: LifecycleConfig,
    pub rewards: Vec<RewardWeight>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            network_id: String::new(),
            loadflow_type: LoadFlowType::Ac,
            action_kinds: vec![ActionKind::DoNothing, ActionKind::Switch],
            observation_history_length: DEFAULT_OBSERVATION_HISTORY_LENGTH,
            granularity: Granularity::Hour,
            lifecycle: LifecycleConfig::default(),
            rewards: vec![
                RewardWeight { kind: RewardKind::LineOverload, weight: 1.0 },
                RewardWeight { kind: RewardKind::LoadMatching, weight: 1.0 },
            ],
        }
    }
}

impl EnvironmentConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, GridError> {
        let raw = fs::read_to_string(path)?;
        let config: EnvironmentConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GridError> {
        if self.observation_history_length == 0 {
            return Err(GridError::Config("observation_history_length must be at least 1".to_string()));
        }
        if self.action_kinds.is_empty() {
            return Err(GridError::Config("action_kinds can't be empty".to_string()));
        }
        let probabilities = std::iter::once(&self.lifecycle.defaults)
            .chain(self.lifecycle.overrides.values())
            .map(|c| c.initial_outage_probability);
        for probability in probabilities {
            if !(0.0..=1.0).contains(&probability) {
                return Err(GridError::Config(format!(
                    "initial_outage_probability {} is outside [0, 1]",
                    probability
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_covers_lines_only() {
        let config = LifecycleConfig::default();
        assert!(config.covers(ElementType::Line));
        assert!(!config.covers(ElementType::Generator));
    }

    #[test]
    fn test_disabled_lifecycle_covers_nothing() {
        let config = LifecycleConfig { enabled: false, ..LifecycleConfig::default() };
        assert!(!config.covers(ElementType::Line));
    }

    #[test]
    fn test_element_seeds_are_offset_by_index() {
        let config = LifecycleConfig::default();
        assert_eq!(config.element_config("L1", 0).seed, Some(DEFAULT_SEED));
        assert_eq!(config.element_config("L2", 3).seed, Some(DEFAULT_SEED + 3));
    }

    #[test]
    fn test_override_keeps_its_own_seed() {
        let mut config = LifecycleConfig::default();
        config.overrides.insert(
            "L7".to_string(),
            ElementLifecycleConfig { lambda_factor: 0.2, seed: Some(7), ..ElementLifecycleConfig::default() },
        );
        let element = config.element_config("L7", 5);
        assert_eq!(element.seed, Some(7));
        assert_eq!(element.lambda_factor, 0.2);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "network_id": "grid", "action_kinds": ["DO_NOTHING", "START_MAINTENANCE"], "granularity": "DAY" }}"#
        )
        .unwrap();
        let config = EnvironmentConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.network_id, "grid");
        assert_eq!(config.granularity, Granularity::Day);
        assert_eq!(config.action_kinds, vec![ActionKind::DoNothing, ActionKind::StartMaintenance]);
        assert_eq!(config.lifecycle.maintenance_duration, MAINTENANCE_DURATION);
    }

    #[test]
    fn test_zero_history_rejected() {
        let config = EnvironmentConfig { observation_history_length: 0, ..EnvironmentConfig::default() };
        assert!(matches!(config.validate(), Err(GridError::Config(_))));
    }
}
