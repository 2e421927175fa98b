use crate::activity::{Activity, ActivityId, Dependency};
use crate::calendar::{CalendarError, WorkCalendar, WorkCalendarConfig};
use crate::config::EngineConfig;
use crate::error::ScheduleError;
use crate::leveling::{
    self, LevelingAlgorithm, LevelingComparison, LevelingError, LevelingInput, LevelingResult,
};
use crate::metadata::ProjectMetadata;
use crate::resource::{Resource, ResourceAssignment};
use crate::schedule::{CriticalPathEngine, ScheduleResult};
use crate::simulation::{DurationDistribution, MonteCarloEngine, SimulationError, SimulationOutput};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything the engines consume, as loaded from a project file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub metadata: ProjectMetadata,
    pub calendar: WorkCalendarConfig,
    pub activities: Vec<Activity>,
    pub dependencies: Vec<Dependency>,
    pub resources: Vec<Resource>,
    pub assignments: Vec<ResourceAssignment>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub distributions: BTreeMap<ActivityId, DurationDistribution>,
    /// Start-no-earlier-than offsets, usually from an applied leveling run.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub start_constraints: BTreeMap<ActivityId, i64>,
    pub config: EngineConfig,
}

impl Project {
    pub fn work_calendar(&self) -> Result<WorkCalendar, CalendarError> {
        WorkCalendar::from_config(&self.calendar)
    }

    /// CPM schedule honoring any start constraints.
    pub fn schedule(&self) -> Result<ScheduleResult, ScheduleError> {
        let engine = CriticalPathEngine::from_parts(&self.activities, &self.dependencies)?;
        if self.start_constraints.is_empty() {
            return Ok(engine.calculate());
        }
        let mut floors = vec![0_i64; engine.dag().len()];
        for (&activity_id, &offset) in &self.start_constraints {
            if let Some(node) = engine.dag().index_of(activity_id) {
                floors[node.index()] = offset;
            }
        }
        engine.calculate_with(engine.base_durations(), Some(floors.as_slice()))
    }

    pub fn level(&self, algorithm: LevelingAlgorithm) -> Result<LevelingResult, LevelingError> {
        let calendar = self.leveling_calendar()?;
        let input = self.leveling_input(&calendar);
        leveling::level_resources_with(
            &input,
            &self.config.leveling,
            &self.config.priority_weights,
            algorithm,
        )
    }

    pub fn compare_leveling(&self) -> Result<LevelingComparison, LevelingError> {
        let calendar = self.leveling_calendar()?;
        let input = self.leveling_input(&calendar);
        leveling::compare_leveling(&input, &self.config.leveling, &self.config.priority_weights)
    }

    /// Keeps a leveling outcome as start constraints for later runs.
    pub fn apply_leveling(&mut self, result: &LevelingResult) {
        self.start_constraints = result.start_constraints();
    }

    pub fn simulate(&self) -> Result<SimulationOutput, SimulationError> {
        let engine = MonteCarloEngine::new(
            &self.activities,
            &self.dependencies,
            &self.distributions,
            self.config.simulation.clone(),
        )?;
        Ok(engine.run())
    }

    fn leveling_calendar(&self) -> Result<WorkCalendar, LevelingError> {
        self.work_calendar()
            .map_err(|err| LevelingError::InvalidInput(err.to_string()))
    }

    fn leveling_input<'a>(&'a self, calendar: &'a WorkCalendar) -> LevelingInput<'a> {
        let input = LevelingInput::new(
            &self.activities,
            &self.dependencies,
            &self.resources,
            &self.assignments,
            calendar,
            self.metadata.project_start_date,
        );
        if self.start_constraints.is_empty() {
            input
        } else {
            input.with_start_constraints(&self.start_constraints)
        }
    }
}
