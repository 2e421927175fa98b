use crate::activity::{Activity, ActivityId, Dependency};
use crate::calculations::float::{self, FloatAnalysis};
use crate::calculations::{BackwardPass, EarlyDates, ForwardPass, LateDates};
use crate::error::{ScheduleCalculationReason, ScheduleError};
use crate::graph::ScheduleDag;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

/// Derived dates for one activity, in working-day offsets from project start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySchedule {
    pub early_start: i64,
    pub early_finish: i64,
    pub late_start: i64,
    pub late_finish: i64,
    pub total_float: i64,
    pub free_float: i64,
    pub is_critical: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub activities: BTreeMap<ActivityId, ActivitySchedule>,
    pub critical_path: Vec<ActivityId>,
    pub project_duration: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub activity_count: usize,
    pub critical_count: usize,
    pub critical_path: Vec<ActivityId>,
    pub project_duration: i64,
    pub max_total_float: Option<i64>,
}

impl ScheduleSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("activities={}", self.activity_count));
        parts.push(format!("critical={}", self.critical_count));
        parts.push(format!("duration={}", self.project_duration));
        if let Some(max_float) = self.max_total_float {
            parts.push(format!("max_float={}", max_float));
        }
        if !self.critical_path.is_empty() {
            let chain = self
                .critical_path
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("->");
            parts.push(format!("crit_path={}", chain));
        }
        parts.join(", ")
    }
}

impl ScheduleResult {
    pub fn get(&self, activity_id: ActivityId) -> Option<&ActivitySchedule> {
        self.activities.get(&activity_id)
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn is_critical(&self, activity_id: ActivityId) -> bool {
        self.activities
            .get(&activity_id)
            .is_some_and(|schedule| schedule.is_critical)
    }

    pub fn summary(&self) -> ScheduleSummary {
        ScheduleSummary {
            activity_count: self.activities.len(),
            critical_count: self.activities.values().filter(|s| s.is_critical).count(),
            critical_path: self.critical_path.clone(),
            project_duration: self.project_duration,
            max_total_float: self.activities.values().map(|s| s.total_float).max(),
        }
    }
}

/// The three stage records of one CPM run, still indexed by node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulePasses {
    pub early: EarlyDates,
    pub late: LateDates,
    pub float: FloatAnalysis,
}

impl SchedulePasses {
    pub fn project_duration(&self) -> i64 {
        self.early.project_finish()
    }

    pub fn to_result(&self, dag: &ScheduleDag) -> ScheduleResult {
        let mut activities = BTreeMap::new();
        let mut critical: Vec<(i64, ActivityId)> = Vec::new();

        for node in dag.graph.node_indices() {
            let idx = node.index();
            let id = dag.activity_id(node);
            let is_critical = self.float.is_critical(idx);
            activities.insert(
                id,
                ActivitySchedule {
                    early_start: self.early.early_start[idx],
                    early_finish: self.early.early_finish[idx],
                    late_start: self.late.late_start[idx],
                    late_finish: self.late.late_finish[idx],
                    total_float: self.float.total_float[idx],
                    free_float: self.float.free_float[idx],
                    is_critical,
                },
            );
            if is_critical {
                critical.push((self.early.early_start[idx], id));
            }
        }

        critical.sort();
        ScheduleResult {
            activities,
            critical_path: critical.into_iter().map(|(_, id)| id).collect(),
            project_duration: self.project_duration(),
        }
    }
}

/// A validated, acyclic network plus its topological order. Build once, then
/// run as many passes as needed with different durations or start floors.
#[derive(Debug, Clone)]
pub struct CriticalPathEngine {
    dag: ScheduleDag,
    order: Vec<NodeIndex>,
}

impl CriticalPathEngine {
    pub fn new(dag: ScheduleDag) -> Result<Self, ScheduleError> {
        let order = dag.topological_order()?;
        Ok(Self { dag, order })
    }

    pub fn from_parts(activities: &[Activity], dependencies: &[Dependency]) -> Result<Self, ScheduleError> {
        Self::new(ScheduleDag::build(activities, dependencies)?)
    }

    pub fn dag(&self) -> &ScheduleDag {
        &self.dag
    }

    pub fn order(&self) -> &[NodeIndex] {
        &self.order
    }

    pub fn base_durations(&self) -> &[i64] {
        &self.dag.durations
    }

    pub fn calculate(&self) -> ScheduleResult {
        self.run_passes(&self.dag.durations, None).to_result(&self.dag)
    }

    pub fn passes(&self, durations: &[i64], start_floors: Option<&[i64]>) -> Result<SchedulePasses, ScheduleError> {
        self.check_durations(durations)?;
        if let Some(floors) = start_floors {
            self.check_len("start floors", floors)?;
        }
        Ok(self.run_passes(durations, start_floors))
    }

    pub fn calculate_with(&self, durations: &[i64], start_floors: Option<&[i64]>) -> Result<ScheduleResult, ScheduleError> {
        Ok(self.passes(durations, start_floors)?.to_result(&self.dag))
    }

    fn run_passes(&self, durations: &[i64], start_floors: Option<&[i64]>) -> SchedulePasses {
        let early = ForwardPass::new(&self.dag, &self.order).execute(durations, start_floors);
        let late = BackwardPass::new(&self.dag, &self.order).execute(durations, &early);
        let float = float::analyze(&self.dag, &early, &late);
        trace!(
            activities = self.dag.len(),
            project_finish = early.project_finish(),
            "cpm passes complete"
        );
        SchedulePasses { early, late, float }
    }

    fn check_len(&self, what: &str, values: &[i64]) -> Result<(), ScheduleError> {
        if values.len() != self.dag.len() {
            return Err(ScheduleError::calculation(
                ScheduleCalculationReason::InvalidDuration,
                format!("expected {} {what}, got {}", self.dag.len(), values.len()),
            ));
        }
        Ok(())
    }

    fn check_durations(&self, durations: &[i64]) -> Result<(), ScheduleError> {
        self.check_len("durations", durations)?;
        if let Some((idx, value)) = durations.iter().enumerate().find(|(_, v)| **v < 0) {
            return Err(ScheduleError::calculation(
                ScheduleCalculationReason::NegativeDuration,
                format!(
                    "activity {} has negative duration {}",
                    self.dag.activity_id(NodeIndex::new(idx)),
                    value
                ),
            ));
        }
        Ok(())
    }
}

/// Runs a full CPM pass over a fresh snapshot.
pub fn calculate_schedule(activities: &[Activity], dependencies: &[Dependency]) -> Result<ScheduleResult, ScheduleError> {
    let engine = CriticalPathEngine::from_parts(activities, dependencies)?;
    Ok(engine.calculate())
}
