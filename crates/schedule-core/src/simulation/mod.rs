//! Network-aware Monte Carlo schedule risk analysis.
//!
//! Every iteration samples a duration for each uncertain activity and runs
//! the full CPM passes on the unchanged network, so merge bias and shifting
//! critical paths show up in the results.

pub mod distribution;
pub mod output;
mod sampling;
pub mod stats;
pub mod tornado;

use crate::activity::{Activity, ActivityId, Dependency};
use crate::error::{ScheduleCalculationReason, ScheduleError};
use crate::schedule::{CriticalPathEngine, SchedulePasses};
use petgraph::graph::NodeIndex;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

pub use distribution::{DistributionError, DistributionSpec, DurationDistribution};
pub use output::{DurationRange, FinishSummary, PercentileSummary, SimulationOutput};
pub use stats::HistogramBin;
pub use tornado::{TornadoBar, tornado};

use distribution::Sampler;
use sampling::SampleMatrix;

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("invalid distribution for activity {activity_id}: {source}")]
    InvalidDistribution {
        activity_id: ActivityId,
        #[source]
        source: DistributionError,
    },
    #[error("iterations must be at least 1, got {0}")]
    InvalidIterations(usize),
    #[error("distribution given for unknown activity {0}")]
    UnknownActivity(ActivityId),
    #[error("invalid simulation config: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub iterations: usize,
    /// Drawn from the thread RNG and reported in the output when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Weight of the mode in the PERT shape parameters.
    pub pert_lambda: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            seed: None,
            pert_lambda: 4.0,
        }
    }
}

impl SimulationConfig {
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.iterations == 0 {
            return Err(SimulationError::InvalidIterations(self.iterations));
        }
        if !self.pert_lambda.is_finite() || self.pert_lambda <= 0.0 {
            return Err(SimulationError::InvalidConfig(format!(
                "pert_lambda must be a positive number, got {}",
                self.pert_lambda
            )));
        }
        Ok(())
    }
}

/// Outcome of one iteration, indexed by node.
#[derive(Debug, Clone)]
struct IterationRow {
    project_duration: f64,
    early_finish: Vec<i64>,
    critical: Vec<bool>,
    fallback: bool,
}

pub struct MonteCarloEngine {
    engine: CriticalPathEngine,
    samplers: Vec<Option<Sampler>>,
    config: SimulationConfig,
}

impl MonteCarloEngine {
    /// Validates the network, the config and every distribution up front.
    pub fn new(
        activities: &[Activity],
        dependencies: &[Dependency],
        distributions: &BTreeMap<ActivityId, DurationDistribution>,
        config: SimulationConfig,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let engine = CriticalPathEngine::from_parts(activities, dependencies)?;

        let mut samplers: Vec<Option<Sampler>> = vec![None; engine.dag().len()];
        for (&activity_id, distribution) in distributions {
            let node = engine
                .dag()
                .index_of(activity_id)
                .ok_or(SimulationError::UnknownActivity(activity_id))?;
            let sampler = Sampler::new(distribution, config.pert_lambda)
                .map_err(|source| SimulationError::InvalidDistribution {
                    activity_id,
                    source,
                })?;
            samplers[node.index()] = Some(sampler);
        }

        Ok(Self {
            engine,
            samplers,
            config,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Runs with the configured seed, or a fresh one when none is set.
    pub fn run(&self) -> SimulationOutput {
        let seed = self.config.seed.unwrap_or_else(|| rand::rng().random());
        self.run_with_seed(seed)
    }

    pub fn run_with_seed(&self, seed: u64) -> SimulationOutput {
        let started = Instant::now();
        let iterations = self.config.iterations;
        let deterministic_duration = self.engine.calculate().project_duration;

        let matrix = SampleMatrix::generate(&self.samplers, self.engine.base_durations(), iterations, seed);
        debug!(iterations = matrix.rows(), seed, activities = self.samplers.len(), "sample matrix generated");

        let rows: Vec<IterationRow> = (0..iterations)
            .into_par_iter()
            .map(|iteration| self.run_iteration(iteration, matrix.row(iteration)))
            .collect();

        let mut output = self.aggregate(&rows, &matrix);
        output.iterations = iterations;
        output.seed = seed;
        output.deterministic_duration = deterministic_duration;
        output.elapsed_ms = started.elapsed().as_millis() as u64;

        if output.fallback_count > 0 {
            warn!(
                fallbacks = output.fallback_count,
                iterations, "some iterations fell back to summed durations"
            );
        }
        info!(
            iterations,
            seed,
            mean = output.mean,
            p50 = output.percentiles.p50,
            p90 = output.percentiles.p90,
            elapsed_ms = output.elapsed_ms,
            "monte carlo simulation complete"
        );
        output
    }

    fn run_iteration(&self, iteration: usize, samples: &[f64]) -> IterationRow {
        match self.sampled_passes(samples) {
            Ok(passes) => {
                let critical = (0..samples.len()).map(|idx| passes.float.is_critical(idx)).collect();
                IterationRow {
                    project_duration: passes.project_duration() as f64,
                    early_finish: passes.early.early_finish,
                    critical,
                    fallback: false,
                }
            }
            Err(err) => {
                warn!(iteration, error = %err, "cpm pass failed; using summed durations");
                let total: f64 = samples
                    .iter()
                    .filter(|value| value.is_finite())
                    .map(|value| value.round().max(0.0))
                    .sum();
                IterationRow {
                    project_duration: total,
                    early_finish: Vec::new(),
                    critical: Vec::new(),
                    fallback: true,
                }
            }
        }
    }

    fn sampled_passes(&self, samples: &[f64]) -> Result<SchedulePasses, ScheduleError> {
        let mut durations = Vec::with_capacity(samples.len());
        for (idx, value) in samples.iter().enumerate() {
            if !value.is_finite() {
                return Err(ScheduleError::calculation(
                    ScheduleCalculationReason::InvalidDuration,
                    format!(
                        "activity {} sampled a non-finite duration",
                        self.engine.dag().activity_id(NodeIndex::new(idx))
                    ),
                ));
            }
            durations.push(value.round().max(0.0) as i64);
        }
        self.engine.passes(&durations, None)
    }

    fn aggregate(&self, rows: &[IterationRow], matrix: &SampleMatrix) -> SimulationOutput {
        let dag = self.engine.dag();
        let iterations = rows.len().max(1) as f64;
        let project_durations: Vec<f64> = rows.iter().map(|row| row.project_duration).collect();
        let mut sorted = project_durations.clone();
        sorted.sort_by(f64::total_cmp);

        let mut criticality = BTreeMap::new();
        let mut finish_percentiles = BTreeMap::new();
        let mut sensitivity = BTreeMap::new();
        let mut duration_ranges = BTreeMap::new();

        for node in dag.graph.node_indices() {
            let idx = node.index();
            let activity_id = dag.activity_id(node);
            let completed = rows.iter().filter(|row| !row.fallback);

            let critical_count = completed.clone().filter(|row| row.critical[idx]).count();
            criticality.insert(activity_id, critical_count as f64 / iterations * 100.0);

            let mut finishes: Vec<f64> = completed.map(|row| row.early_finish[idx] as f64).collect();
            finishes.sort_by(f64::total_cmp);
            let summary = PercentileSummary::from_sorted(&finishes);
            finish_percentiles.insert(
                activity_id,
                FinishSummary {
                    p10: summary.p10,
                    p50: summary.p50,
                    p80: summary.p80,
                    p90: summary.p90,
                    mean: stats::mean(&finishes),
                },
            );

            let column = matrix.column(idx);
            sensitivity.insert(activity_id, stats::pearson(&column, &project_durations));
            let finite = column.iter().copied().filter(|v| v.is_finite());
            let range = finite.fold(None, |acc: Option<DurationRange>, v| {
                Some(match acc {
                    None => DurationRange { min: v, max: v },
                    Some(r) => DurationRange {
                        min: r.min.min(v),
                        max: r.max.max(v),
                    },
                })
            });
            duration_ranges.insert(activity_id, range.unwrap_or_default());
        }

        SimulationOutput {
            percentiles: PercentileSummary::from_sorted(&sorted),
            mean: stats::mean(&project_durations),
            std_dev: stats::std_dev(&project_durations),
            min: sorted.first().copied().unwrap_or(0.0),
            max: sorted.last().copied().unwrap_or(0.0),
            histogram: stats::histogram(&sorted),
            fallback_count: rows.iter().filter(|row| row.fallback).count(),
            project_durations,
            criticality,
            finish_percentiles,
            sensitivity,
            duration_ranges,
            iterations: rows.len(),
            elapsed_ms: 0,
            seed: 0,
            deterministic_duration: 0,
        }
    }
}
