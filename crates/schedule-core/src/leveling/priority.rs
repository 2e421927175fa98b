use crate::leveling::LevelingError;
use serde::{Deserialize, Serialize};

/// Weights of the parallel strategy's priority score. Higher scores keep
/// their slot; the lowest scoring activity in a conflict is delayed first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityWeights {
    /// Penalty per day of total float.
    pub float_weight: f64,
    /// Bonus for activities on the critical path.
    pub critical_weight: f64,
    /// Bonus scaled by the share of the activity's resources that are
    /// over-allocated somewhere.
    pub resource_criticality_weight: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            float_weight: 1.0,
            critical_weight: 100.0,
            resource_criticality_weight: 10.0,
        }
    }
}

impl PriorityWeights {
    pub fn validate(&self) -> Result<(), LevelingError> {
        let weights = [
            ("float_weight", self.float_weight),
            ("critical_weight", self.critical_weight),
            ("resource_criticality_weight", self.resource_criticality_weight),
        ];
        for (name, value) in weights {
            if !value.is_finite() {
                return Err(LevelingError::InvalidOptions(format!(
                    "priority weight {name} must be finite, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// `critical_weight·[critical] + resource_criticality_weight·rc − float_weight·total_float`
pub fn priority_score(
    weights: &PriorityWeights,
    is_critical: bool,
    resource_criticality: f64,
    total_float: i64,
) -> f64 {
    let critical = if is_critical { weights.critical_weight } else { 0.0 };
    critical + weights.resource_criticality_weight * resource_criticality
        - weights.float_weight * total_float as f64
}
