use crate::activity::ActivityId;
use crate::simulation::stats::{self, HistogramBin};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentileSummary {
    pub p10: f64,
    pub p50: f64,
    pub p80: f64,
    pub p90: f64,
}

impl PercentileSummary {
    pub(crate) fn from_sorted(sorted: &[f64]) -> Self {
        let at = |p| stats::percentile(sorted, p).unwrap_or(0.0);
        Self {
            p10: at(10.0),
            p50: at(50.0),
            p80: at(80.0),
            p90: at(90.0),
        }
    }
}

/// Early-finish distribution of one activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FinishSummary {
    pub p10: f64,
    pub p50: f64,
    pub p80: f64,
    pub p90: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DurationRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    /// Project duration of every iteration, in iteration order.
    pub project_durations: Vec<f64>,
    pub percentiles: PercentileSummary,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// Percentage of iterations in which each activity was critical.
    pub criticality: BTreeMap<ActivityId, f64>,
    pub finish_percentiles: BTreeMap<ActivityId, FinishSummary>,
    /// Pearson correlation of each activity's sampled duration with the
    /// project duration.
    pub sensitivity: BTreeMap<ActivityId, f64>,
    pub duration_ranges: BTreeMap<ActivityId, DurationRange>,
    pub histogram: Vec<HistogramBin>,
    pub iterations: usize,
    pub elapsed_ms: u64,
    pub seed: u64,
    pub fallback_count: usize,
    /// Project duration of the unperturbed network.
    pub deterministic_duration: i64,
}

impl SimulationOutput {
    /// Share of iterations (0..=1) finishing within `days`.
    pub fn probability_of_completion(&self, days: f64) -> f64 {
        if self.project_durations.is_empty() {
            return 0.0;
        }
        let within = self.project_durations.iter().filter(|&&d| d <= days).count();
        within as f64 / self.project_durations.len() as f64
    }

    pub fn percentile(&self, p: f64) -> Option<f64> {
        let mut sorted = self.project_durations.clone();
        sorted.sort_by(f64::total_cmp);
        stats::percentile(&sorted, p)
    }

    pub fn criticality_of(&self, activity_id: ActivityId) -> f64 {
        self.criticality.get(&activity_id).copied().unwrap_or(0.0)
    }

    pub fn sensitivity_of(&self, activity_id: ActivityId) -> f64 {
        self.sensitivity.get(&activity_id).copied().unwrap_or(0.0)
    }
}
