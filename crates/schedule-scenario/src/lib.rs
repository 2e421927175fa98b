//! What-if analysis on top of the Monte Carlo engine.
//!
//! A [`Scenario`] is a named list of edits to activity durations and
//! distributions. [`run_scenario`] simulates the untouched network and the
//! edited copy with the same seed, so the deltas come from the edits and not
//! from sampling noise.

use schedule_engine::{
    Activity, ActivityId, Dependency, DurationDistribution, MonteCarloEngine, Project,
    SimulationConfig, SimulationError, SimulationOutput,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("scenario '{scenario}' edits unknown activity {activity_id}")]
    UnknownActivity {
        scenario: String,
        activity_id: ActivityId,
    },
    #[error("scenario '{scenario}' sets a negative duration {duration} on activity {activity_id}")]
    NegativeDuration {
        scenario: String,
        activity_id: ActivityId,
        duration: i64,
    },
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ActivityChange {
    /// New deterministic duration. A distribution on the same activity still
    /// drives its sampled duration.
    Duration(i64),
    Distribution(DurationDistribution),
    /// Fall back to the deterministic duration.
    ClearDistribution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEdit {
    pub activity_id: ActivityId,
    pub change: ActivityChange,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub edits: Vec<ScenarioEdit>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            edits: Vec::new(),
        }
    }

    pub fn with_edit(mut self, activity_id: ActivityId, change: ActivityChange) -> Self {
        self.edits.push(ScenarioEdit {
            activity_id,
            change,
        });
        self
    }

    /// Returns edited copies of `activities` and `distributions`. Edits are
    /// applied in order, so a later edit of the same activity wins.
    pub fn apply(
        &self,
        activities: &[Activity],
        distributions: &BTreeMap<ActivityId, DurationDistribution>,
    ) -> Result<(Vec<Activity>, BTreeMap<ActivityId, DurationDistribution>), ScenarioError> {
        let mut activities = activities.to_vec();
        let mut distributions = distributions.clone();
        let known: HashSet<ActivityId> = activities.iter().map(|a| a.id).collect();

        for edit in &self.edits {
            if !known.contains(&edit.activity_id) {
                return Err(ScenarioError::UnknownActivity {
                    scenario: self.name.clone(),
                    activity_id: edit.activity_id,
                });
            }
            match &edit.change {
                ActivityChange::Duration(duration) => {
                    if *duration < 0 {
                        return Err(ScenarioError::NegativeDuration {
                            scenario: self.name.clone(),
                            activity_id: edit.activity_id,
                            duration: *duration,
                        });
                    }
                    for activity in activities.iter_mut().filter(|a| a.id == edit.activity_id) {
                        activity.duration_days = *duration;
                    }
                }
                ActivityChange::Distribution(distribution) => {
                    distributions.insert(edit.activity_id, *distribution);
                }
                ActivityChange::ClearDistribution => {
                    distributions.remove(&edit.activity_id);
                }
            }
            debug!(scenario = %self.name, activity = edit.activity_id, change = ?edit.change, "scenario edit applied");
        }
        Ok((activities, distributions))
    }

    /// Copy of `project` with the edits applied.
    pub fn apply_to_project(&self, project: &Project) -> Result<Project, ScenarioError> {
        let (activities, distributions) = self.apply(&project.activities, &project.distributions)?;
        Ok(Project {
            activities,
            distributions,
            ..project.clone()
        })
    }
}

/// Baseline against scenario. Deltas are scenario minus baseline, in
/// working days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub name: String,
    pub mean_delta: f64,
    pub p50_delta: f64,
    pub p80_delta: f64,
    pub p90_delta: f64,
    pub deterministic_delta: i64,
    pub baseline: SimulationOutput,
    pub scenario: SimulationOutput,
}

impl ScenarioComparison {
    fn between(name: &str, baseline: SimulationOutput, scenario: SimulationOutput) -> Self {
        Self {
            name: name.to_string(),
            mean_delta: scenario.mean - baseline.mean,
            p50_delta: scenario.percentiles.p50 - baseline.percentiles.p50,
            p80_delta: scenario.percentiles.p80 - baseline.percentiles.p80,
            p90_delta: scenario.percentiles.p90 - baseline.percentiles.p90,
            deterministic_delta: scenario.deterministic_duration - baseline.deterministic_duration,
            baseline,
            scenario,
        }
    }
}

/// Simulates the baseline, then the scenario with the baseline's seed. Both
/// networks are validated before either runs.
pub fn run_scenario(
    activities: &[Activity],
    dependencies: &[Dependency],
    distributions: &BTreeMap<ActivityId, DurationDistribution>,
    scenario: &Scenario,
    config: &SimulationConfig,
) -> Result<ScenarioComparison, ScenarioError> {
    let (edited, edited_distributions) = scenario.apply(activities, distributions)?;

    let baseline = MonteCarloEngine::new(activities, dependencies, distributions, config.clone())?;
    let edited_engine = MonteCarloEngine::new(&edited, dependencies, &edited_distributions, config.clone())?;

    let baseline = baseline.run();
    let scenario_output = edited_engine.run_with_seed(baseline.seed);

    let comparison = ScenarioComparison::between(&scenario.name, baseline, scenario_output);
    info!(
        scenario = %comparison.name,
        seed = comparison.baseline.seed,
        mean_delta = comparison.mean_delta,
        p90_delta = comparison.p90_delta,
        "scenario compared"
    );
    Ok(comparison)
}

/// [`run_scenario`] over a project's network, distributions and simulation
/// config.
pub fn run_project_scenario(
    project: &Project,
    scenario: &Scenario,
) -> Result<ScenarioComparison, ScenarioError> {
    run_scenario(
        &project.activities,
        &project.dependencies,
        &project.distributions,
        scenario,
        &project.config.simulation,
    )
}
