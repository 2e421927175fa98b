//! Resource leveling.
//!
//! Leveling delays activities until no resource is asked for more hours on a
//! working day than it has. Every delay is expressed as a start-no-earlier-than
//! floor that is fed back into the CPM forward pass, so a leveled schedule is
//! always a legal schedule for the same network.
//!
//! Two strategies are provided: [`LevelingAlgorithm::Serial`] repeatedly
//! fixes the single worst conflict, [`LevelingAlgorithm::Parallel`] works
//! through the whole conflict matrix per sweep using [`PriorityWeights`].
//! [`compare_leveling`] runs both and recommends one.

pub mod compare;
mod parallel;
pub mod priority;
mod serial;
mod state;
pub mod usage;

use crate::activity::{Activity, ActivityId, Dependency};
use crate::calendar::WorkCalendar;
use crate::error::ScheduleError;
use crate::resource::{Resource, ResourceAssignment};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::info;

pub use compare::{LevelingComparison, compare_leveling, recommend};
pub use priority::{PriorityWeights, priority_score};
pub use usage::{OverAllocation, detect_over_allocations};

use state::LevelingState;

pub const MAX_ITERATIONS_LIMIT: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum LevelingError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("invalid leveling options: {0}")]
    InvalidOptions(String),
    #[error("invalid leveling input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelingAlgorithm {
    #[default]
    Serial,
    Parallel,
}

impl LevelingAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelingAlgorithm::Serial => "serial",
            LevelingAlgorithm::Parallel => "parallel",
        }
    }
}

impl fmt::Display for LevelingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LevelingAlgorithm {
    type Err = LevelingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serial" => Ok(LevelingAlgorithm::Serial),
            "parallel" => Ok(LevelingAlgorithm::Parallel),
            other => Err(LevelingError::InvalidOptions(format!(
                "unknown leveling algorithm '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelingOptions {
    /// Never move an activity that was critical before leveling.
    pub preserve_critical_path: bool,
    pub max_iterations: usize,
    /// Only these resources are leveled when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_resources: Option<Vec<String>>,
    /// Delays must fit in the activity's total float.
    pub level_within_float: bool,
}

impl Default for LevelingOptions {
    fn default() -> Self {
        Self {
            preserve_critical_path: true,
            max_iterations: 100,
            target_resources: None,
            level_within_float: false,
        }
    }
}

impl LevelingOptions {
    pub fn validate(&self) -> Result<(), LevelingError> {
        if !(1..=MAX_ITERATIONS_LIMIT).contains(&self.max_iterations) {
            return Err(LevelingError::InvalidOptions(format!(
                "max_iterations must be between 1 and {MAX_ITERATIONS_LIMIT}, got {}",
                self.max_iterations
            )));
        }
        Ok(())
    }

    pub(crate) fn targets(&self, resource_id: &str) -> bool {
        self.target_resources
            .as_ref()
            .is_none_or(|targets| targets.iter().any(|id| id == resource_id))
    }
}

/// Read-only view of everything leveling needs.
#[derive(Debug, Clone, Copy)]
pub struct LevelingInput<'a> {
    pub activities: &'a [Activity],
    pub dependencies: &'a [Dependency],
    pub resources: &'a [Resource],
    pub assignments: &'a [ResourceAssignment],
    pub calendar: &'a WorkCalendar,
    pub project_start: NaiveDate,
    /// Start-no-earlier-than offsets applied before leveling, e.g. the
    /// constraints returned by an earlier run.
    pub start_constraints: Option<&'a BTreeMap<ActivityId, i64>>,
}

impl<'a> LevelingInput<'a> {
    pub fn new(
        activities: &'a [Activity],
        dependencies: &'a [Dependency],
        resources: &'a [Resource],
        assignments: &'a [ResourceAssignment],
        calendar: &'a WorkCalendar,
        project_start: NaiveDate,
    ) -> Self {
        Self {
            activities,
            dependencies,
            resources,
            assignments,
            calendar,
            project_start,
            start_constraints: None,
        }
    }

    pub fn with_start_constraints(mut self, constraints: &'a BTreeMap<ActivityId, i64>) -> Self {
        self.start_constraints = Some(constraints);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityShift {
    pub activity_id: ActivityId,
    pub original_start: NaiveDate,
    pub original_finish: NaiveDate,
    pub new_start: NaiveDate,
    pub new_finish: NaiveDate,
    pub delay_days: i64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelingResult {
    pub algorithm: LevelingAlgorithm,
    pub shifts: Vec<ActivityShift>,
    pub iterations: usize,
    pub activities_shifted: usize,
    pub remaining_over_allocations: Vec<OverAllocation>,
    pub original_finish: NaiveDate,
    pub new_finish: NaiveDate,
    pub original_duration_days: i64,
    pub new_duration_days: i64,
    pub success: bool,
    pub warnings: Vec<String>,
    /// Leveled start offsets of every activity, keyed by id.
    pub leveled_starts: BTreeMap<ActivityId, i64>,
}

impl LevelingResult {
    /// Working days the project finish moved out by.
    pub fn schedule_extension_days(&self) -> i64 {
        self.new_duration_days - self.original_duration_days
    }

    /// Start constraints that reproduce this leveled schedule when passed
    /// back in through [`LevelingInput::with_start_constraints`].
    pub fn start_constraints(&self) -> BTreeMap<ActivityId, i64> {
        self.leveled_starts.clone()
    }
}

/// Levels with the default [`PriorityWeights`].
pub fn level_resources(
    input: &LevelingInput<'_>,
    options: &LevelingOptions,
    algorithm: LevelingAlgorithm,
) -> Result<LevelingResult, LevelingError> {
    level_resources_with(input, options, &PriorityWeights::default(), algorithm)
}

pub fn level_resources_with(
    input: &LevelingInput<'_>,
    options: &LevelingOptions,
    weights: &PriorityWeights,
    algorithm: LevelingAlgorithm,
) -> Result<LevelingResult, LevelingError> {
    options.validate()?;
    weights.validate()?;
    let mut state = LevelingState::new(input, options)?;

    let iterations = match algorithm {
        LevelingAlgorithm::Serial => serial::run(&mut state, options),
        LevelingAlgorithm::Parallel => parallel::run(&mut state, options, weights),
    };

    let result = state.finish(algorithm, iterations);
    info!(
        algorithm = %algorithm,
        iterations = result.iterations,
        shifted = result.activities_shifted,
        remaining = result.remaining_over_allocations.len(),
        extension_days = result.schedule_extension_days(),
        "resource leveling complete"
    );
    Ok(result)
}
