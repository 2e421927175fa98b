use crate::activity::ActivityId;
use std::fmt;

/// Machine-readable cause attached to [`ScheduleError::Calculation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleCalculationReason {
    UnknownActivity,
    DuplicateActivity,
    NegativeDuration,
    InvalidDuration,
    NoTopologicalOrder,
}

impl ScheduleCalculationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleCalculationReason::UnknownActivity => "unknown_activity",
            ScheduleCalculationReason::DuplicateActivity => "duplicate_activity",
            ScheduleCalculationReason::NegativeDuration => "negative_duration",
            ScheduleCalculationReason::InvalidDuration => "invalid_duration",
            ScheduleCalculationReason::NoTopologicalOrder => "no_topological_order",
        }
    }
}

impl fmt::Display for ScheduleCalculationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// The ids form a closed loop: the last id repeats the first.
    #[error("circular dependency detected: {}", join_cycle(.cycle))]
    CircularDependency { cycle: Vec<ActivityId> },

    #[error("schedule calculation failed ({reason}): {detail}")]
    Calculation {
        reason: ScheduleCalculationReason,
        detail: String,
    },
}

impl ScheduleError {
    pub(crate) fn calculation(reason: ScheduleCalculationReason, detail: impl Into<String>) -> Self {
        ScheduleError::Calculation {
            reason,
            detail: detail.into(),
        }
    }

    pub fn cycle(&self) -> Option<&[ActivityId]> {
        match self {
            ScheduleError::CircularDependency { cycle } => Some(cycle),
            ScheduleError::Calculation { .. } => None,
        }
    }
}

fn join_cycle(cycle: &[ActivityId]) -> String {
    cycle
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
