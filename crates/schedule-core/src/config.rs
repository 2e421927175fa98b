use crate::leveling::{LevelingOptions, PriorityWeights};
use crate::simulation::SimulationConfig;
use serde::{Deserialize, Serialize};

pub const ITERATIONS_ENV: &str = "SCHEDULE_ENGINE_ITERATIONS";
pub const SEED_ENV: &str = "SCHEDULE_ENGINE_SEED";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidOverride {
        key: String,
        value: String,
        reason: String,
    },
}

/// Tunables for every engine. Missing sections and fields fall back to
/// their defaults when deserialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub leveling: LevelingOptions,
    pub priority_weights: PriorityWeights,
    pub simulation: SimulationConfig,
}

impl EngineConfig {
    /// Applies `SCHEDULE_ENGINE_ITERATIONS` and `SCHEDULE_ENGINE_SEED`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ITERATIONS_ENV) {
            self.simulation.iterations = parse_override(ITERATIONS_ENV, &raw)?;
        }
        if let Some(raw) = lookup(SEED_ENV) {
            self.simulation.seed = Some(parse_override(SEED_ENV, &raw)?);
        }
        Ok(())
    }
}

fn parse_override<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|err: T::Err| ConfigError::InvalidOverride {
        key: key.to_string(),
        value: raw.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"simulation": {"iterations": 250}}"#).unwrap();
        assert_eq!(config.simulation.iterations, 250);
        assert_eq!(config.simulation.pert_lambda, 4.0);
        assert_eq!(config.leveling, LevelingOptions::default());
        assert_eq!(config.priority_weights, PriorityWeights::default());
    }

    #[test]
    fn overrides_replace_iterations_and_seed() {
        let vars: HashMap<&str, &str> = HashMap::from([(ITERATIONS_ENV, "64"), (SEED_ENV, " 9 ")]);
        let mut config = EngineConfig::default();
        config
            .apply_overrides_from(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.simulation.iterations, 64);
        assert_eq!(config.simulation.seed, Some(9));
    }

    #[test]
    fn malformed_override_is_reported() {
        let mut config = EngineConfig::default();
        let err = config
            .apply_overrides_from(|key| (key == SEED_ENV).then(|| "abc".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOverride { ref key, .. } if key == SEED_ENV));
    }
}
