use crate::activity::ActivityId;
use crate::leveling::usage::{CAPACITY_EPSILON, DateAxis, Load, LoadSpan, OverAllocation};
use crate::leveling::{
    ActivityShift, LevelingAlgorithm, LevelingError, LevelingInput, LevelingOptions,
    LevelingResult,
};
use crate::resource::{Resource, ResourceAssignment};
use crate::schedule::{CriticalPathEngine, SchedulePasses};
use crate::validation;
use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use tracing::{debug, warn};

/// Working days searched past the conflict for a slot with room.
const FIT_SEARCH_HORIZON: i64 = 260;

const PUSHED_REASON: &str = "pushed by predecessor shift";

/// Why a proposed delay was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ShiftRejection {
    Critical(ActivityId),
    RipplesIntoCritical { shifted: ActivityId, critical: ActivityId },
    ExceedsFloat { activity: ActivityId, delay: i64, float: i64 },
    ExtendsProject(ActivityId),
    NoProgress(ActivityId),
    StillOverAllocated(ActivityId),
    Calculation(String),
}

impl fmt::Display for ShiftRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftRejection::Critical(id) => write!(f, "activity {id} is on the critical path"),
            ShiftRejection::RipplesIntoCritical { shifted, critical } => write!(
                f,
                "delaying activity {shifted} would move critical activity {critical}"
            ),
            ShiftRejection::ExceedsFloat {
                activity,
                delay,
                float,
            } => write!(
                f,
                "delay of {delay} days exceeds the {float} days of float on activity {activity}"
            ),
            ShiftRejection::ExtendsProject(id) => {
                write!(f, "delaying activity {id} would extend the project")
            }
            ShiftRejection::NoProgress(id) => {
                write!(f, "activity {id} cannot move off the conflict day")
            }
            ShiftRejection::StillOverAllocated(id) => {
                write!(f, "activity {id} would still exceed the resource capacity on its own")
            }
            ShiftRejection::Calculation(detail) => write!(f, "{detail}"),
        }
    }
}

/// Mutable working state shared by both strategies: the network, the
/// resolved assignment loads and the floors applied so far.
pub(crate) struct LevelingState<'a> {
    resources: &'a [Resource],
    engine: CriticalPathEngine,
    axis: DateAxis<'a>,
    loads: Vec<Load>,
    targeted: Vec<bool>,
    original: SchedulePasses,
    original_critical: Vec<bool>,
    floors: Vec<i64>,
    current: SchedulePasses,
    preserve_critical_path: bool,
    level_within_float: bool,
    reasons: HashMap<usize, String>,
    warnings: Vec<String>,
}

impl<'a> LevelingState<'a> {
    pub fn new(input: &LevelingInput<'a>, options: &LevelingOptions) -> Result<Self, LevelingError> {
        let resource_ids = validate_resources(input.resources)?;
        let engine = CriticalPathEngine::from_parts(input.activities, input.dependencies)?;
        let dag = engine.dag();
        let mut warnings = Vec::new();

        let mut floors = vec![0_i64; dag.len()];
        if let Some(constraints) = input.start_constraints {
            for (&activity_id, &offset) in constraints {
                match dag.index_of(activity_id) {
                    Some(node) => floors[node.index()] = offset,
                    None => warnings.push(format!(
                        "start constraint for unknown activity {activity_id} ignored"
                    )),
                }
            }
        }

        let original = engine.passes(engine.base_durations(), Some(floors.as_slice()))?;
        let original_critical = (0..dag.len()).map(|idx| original.float.is_critical(idx)).collect();
        let axis = DateAxis::new(input.calendar, input.project_start);

        let mut loads = Vec::with_capacity(input.assignments.len());
        for assignment in input.assignments {
            validation::validate_assignment(assignment).map_err(LevelingError::InvalidInput)?;
            let Some(&resource) = resource_ids.get(assignment.resource_id.as_str()) else {
                warnings.push(format!(
                    "assignment on activity {} references unknown resource '{}'",
                    assignment.activity_id, assignment.resource_id
                ));
                continue;
            };
            let Some(node) = dag.index_of(assignment.activity_id) else {
                warnings.push(format!(
                    "assignment of '{}' references unknown activity {}",
                    assignment.resource_id, assignment.activity_id
                ));
                continue;
            };
            let demand = assignment.demand(&input.resources[resource]);
            if demand <= CAPACITY_EPSILON {
                continue;
            }
            let idx = node.index();
            loads.push(Load {
                node: idx,
                resource,
                demand,
                span: load_span(
                    assignment,
                    &axis,
                    original.early.early_start[idx],
                    engine.base_durations()[idx],
                ),
            });
        }

        let targeted = input
            .resources
            .iter()
            .map(|resource| options.targets(&resource.id))
            .collect();

        for message in &warnings {
            warn!("{message}");
        }

        Ok(Self {
            resources: input.resources,
            current: original.clone(),
            engine,
            axis,
            loads,
            targeted,
            original,
            original_critical,
            floors,
            preserve_critical_path: options.preserve_critical_path,
            level_within_float: options.level_within_float,
            reasons: HashMap::new(),
            warnings,
        })
    }

    pub fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }

    pub fn activity_id(&self, node: usize) -> ActivityId {
        self.engine.dag().activity_id(NodeIndex::new(node))
    }

    pub fn early_start(&self, node: usize) -> i64 {
        self.current.early.early_start[node]
    }

    pub fn total_float(&self, node: usize) -> i64 {
        self.current.float.total_float[node]
    }

    pub fn is_critical(&self, node: usize) -> bool {
        self.current.float.is_critical(node)
    }

    pub fn resource_index(&self, resource_id: &str) -> Option<usize> {
        self.resources.iter().position(|r| r.id == resource_id)
    }

    fn duration(&self, node: usize) -> i64 {
        self.engine.base_durations()[node]
    }

    fn covers(&self, load: &Load, offset: i64) -> bool {
        load.covers(self.early_start(load.node), self.duration(load.node), offset)
    }

    /// Hours booked on `resource` at `offset`, optionally leaving one
    /// activity out.
    pub fn demand_on(&self, resource: usize, offset: i64, skip: Option<usize>) -> f64 {
        self.loads
            .iter()
            .filter(|load| load.resource == resource && Some(load.node) != skip)
            .filter(|load| self.covers(load, offset))
            .map(|load| load.demand)
            .sum()
    }

    pub fn capacity_on(&mut self, resource: usize, offset: i64) -> f64 {
        let date = self.axis.date(offset);
        self.resources[resource].available_capacity(date, self.axis.calendar())
    }

    pub fn is_over_allocated(&mut self, resource: usize, offset: i64) -> bool {
        let demand = self.demand_on(resource, offset, None);
        demand > self.capacity_on(resource, offset) + CAPACITY_EPSILON
    }

    /// Activities drawing on `resource` at `offset`, by node.
    pub fn contributors(&self, resource: usize, offset: i64) -> Vec<usize> {
        let nodes: BTreeSet<usize> = self
            .loads
            .iter()
            .filter(|load| load.resource == resource && self.covers(load, offset))
            .map(|load| load.node)
            .collect();
        nodes.into_iter().collect()
    }

    /// Full conflict matrix for the current schedule, unordered.
    pub fn conflicts(&mut self) -> Vec<OverAllocation> {
        let mut days: BTreeMap<(usize, i64), (f64, BTreeSet<ActivityId>)> = BTreeMap::new();
        for load in &self.loads {
            if !self.targeted[load.resource] {
                continue;
            }
            let Some((first, last)) = load.days(self.early_start(load.node), self.duration(load.node))
            else {
                continue;
            };
            let activity_id = self.activity_id(load.node);
            for offset in first..=last {
                let entry = days.entry((load.resource, offset)).or_default();
                entry.0 += load.demand;
                entry.1.insert(activity_id);
            }
        }

        let mut conflicts = Vec::new();
        for ((resource, offset), (demand, activities)) in days {
            let date = self.axis.date(offset);
            let capacity = self.resources[resource].available_capacity(date, self.axis.calendar());
            if demand > capacity + CAPACITY_EPSILON {
                conflicts.push(OverAllocation {
                    resource_id: self.resources[resource].id.clone(),
                    date,
                    offset,
                    demand,
                    capacity,
                    activities: activities.into_iter().collect(),
                });
            }
        }
        conflicts
    }

    /// Delay that moves every span of `node` on `resource` past `offset`.
    pub fn delay_to_vacate(&self, node: usize, resource: usize, offset: i64) -> i64 {
        let start = self.early_start(node);
        let duration = self.duration(node);
        self.loads
            .iter()
            .filter(|load| load.node == node && load.resource == resource)
            .filter_map(|load| load.days(start, duration))
            .filter(|(first, last)| (*first..=*last).contains(&offset))
            .map(|(first, _)| offset - first + 1)
            .max()
            .unwrap_or(0)
    }

    /// True when the activity alone asks for more than the resource's
    /// standard day, so moving it cannot help.
    pub fn exceeds_standard_capacity(&self, node: usize, resource: usize) -> bool {
        let own: f64 = self
            .loads
            .iter()
            .filter(|load| load.node == node && load.resource == resource)
            .map(|load| load.demand)
            .sum();
        own > self.resources[resource].daily_capacity + CAPACITY_EPSILON
    }

    fn own_loads(&self, node: usize, resource: usize) -> Vec<Load> {
        self.loads
            .iter()
            .filter(|load| load.node == node && load.resource == resource)
            .cloned()
            .collect()
    }

    /// True when some day of the slot starting at `start` would be
    /// over-allocated by `node` alone, so moving there cannot clear anything.
    fn overflows_alone(&mut self, node: usize, resource: usize, start: i64) -> bool {
        let duration = self.duration(node);
        let own = self.own_loads(node, resource);
        booked_days(&own, start, duration).into_iter().any(|offset| {
            booked_on(&own, start, duration, offset)
                > self.capacity_on(resource, offset) + CAPACITY_EPSILON
        })
    }

    /// Earliest start at or after `from` where `resource` has room for every
    /// day `node` would book on it, given where everything else sits now.
    pub fn earliest_fit(&mut self, node: usize, resource: usize, from: i64) -> Option<i64> {
        let duration = self.duration(node);
        let own = self.own_loads(node, resource);

        'candidate: for start in from..from + FIT_SEARCH_HORIZON {
            for offset in booked_days(&own, start, duration) {
                let booked = booked_on(&own, start, duration, offset);
                let others = self.demand_on(resource, offset, Some(node));
                if others + booked > self.capacity_on(resource, offset) + CAPACITY_EPSILON {
                    continue 'candidate;
                }
            }
            return Some(start);
        }
        None
    }

    /// Share of the activity's leveled resources that are over-allocated.
    pub fn resource_criticality(&self, node: usize, over_allocated: &HashSet<usize>) -> f64 {
        let resources: BTreeSet<usize> = self
            .loads
            .iter()
            .filter(|load| load.node == node && self.targeted[load.resource])
            .map(|load| load.resource)
            .collect();
        if resources.is_empty() {
            return 0.0;
        }
        let hot = resources.iter().filter(|r| over_allocated.contains(r)).count();
        hot as f64 / resources.len() as f64
    }

    /// Raises the start floor of `node` to `new_start` and recomputes the
    /// schedule, unless the options forbid the result or the new slot on
    /// `resource` is still over-allocated by the activity alone.
    pub fn try_shift(
        &mut self,
        node: usize,
        resource: usize,
        new_start: i64,
        reason: String,
    ) -> Result<(), ShiftRejection> {
        let activity_id = self.activity_id(node);
        let delay = new_start - self.early_start(node);
        if delay <= 0 {
            return Err(ShiftRejection::NoProgress(activity_id));
        }
        if self.overflows_alone(node, resource, new_start) {
            return Err(ShiftRejection::StillOverAllocated(activity_id));
        }
        if self.preserve_critical_path && self.original_critical[node] {
            return Err(ShiftRejection::Critical(activity_id));
        }
        if self.level_within_float && delay > self.total_float(node) {
            return Err(ShiftRejection::ExceedsFloat {
                activity: activity_id,
                delay,
                float: self.total_float(node),
            });
        }

        let mut floors = self.floors.clone();
        floors[node] = floors[node].max(new_start);
        let passes = self
            .engine
            .passes(self.engine.base_durations(), Some(floors.as_slice()))
            .map_err(|err| ShiftRejection::Calculation(err.to_string()))?;

        if self.preserve_critical_path {
            let moved = (0..floors.len()).find(|&idx| {
                self.original_critical[idx]
                    && passes.early.early_start[idx] != self.original.early.early_start[idx]
            });
            if let Some(idx) = moved {
                return Err(ShiftRejection::RipplesIntoCritical {
                    shifted: activity_id,
                    critical: self.activity_id(idx),
                });
            }
        }
        if self.level_within_float && passes.project_duration() > self.current.project_duration() {
            return Err(ShiftRejection::ExtendsProject(activity_id));
        }

        debug!(activity = activity_id, delay, new_start, "activity shifted");
        self.floors = floors;
        self.current = passes;
        self.reasons.insert(node, reason);
        Ok(())
    }

    pub fn finish(mut self, algorithm: LevelingAlgorithm, iterations: usize) -> LevelingResult {
        let remaining = self.conflicts();
        let dag = self.engine.dag();
        let mut shifts = Vec::new();
        let mut leveled_starts = BTreeMap::new();

        for node in dag.graph.node_indices() {
            let idx = node.index();
            let activity_id = dag.activity_id(node);
            let duration = self.engine.base_durations()[idx];
            let original_start = self.original.early.early_start[idx];
            let new_start = self.current.early.early_start[idx];
            leveled_starts.insert(activity_id, new_start);
            if new_start == original_start {
                continue;
            }
            shifts.push(ActivityShift {
                activity_id,
                original_start: self.axis.date(original_start),
                original_finish: self.axis.finish_date(original_start, duration),
                new_start: self.axis.date(new_start),
                new_finish: self.axis.finish_date(new_start, duration),
                delay_days: new_start - original_start,
                reason: self
                    .reasons
                    .get(&idx)
                    .cloned()
                    .unwrap_or_else(|| PUSHED_REASON.to_string()),
            });
        }
        shifts.sort_by_key(|shift| shift.activity_id);

        let original_duration_days = self.original.project_duration();
        let new_duration_days = self.current.project_duration();
        let original_finish = self.axis.finish_date(0, original_duration_days);
        let new_finish = self.axis.finish_date(0, new_duration_days);

        LevelingResult {
            algorithm,
            activities_shifted: shifts.len(),
            shifts,
            iterations,
            success: remaining.is_empty(),
            remaining_over_allocations: remaining,
            original_finish,
            new_finish,
            original_duration_days,
            new_duration_days,
            warnings: self.warnings,
            leveled_starts,
        }
    }
}

fn booked_days(own: &[Load], start: i64, duration: i64) -> BTreeSet<i64> {
    own.iter()
        .filter_map(|load| load.days(start, duration))
        .flat_map(|(first, last)| first..=last)
        .collect()
}

fn booked_on(own: &[Load], start: i64, duration: i64, offset: i64) -> f64 {
    own.iter()
        .filter(|load| load.covers(start, duration, offset))
        .map(|load| load.demand)
        .sum()
}

fn validate_resources(resources: &[Resource]) -> Result<HashMap<&str, usize>, LevelingError> {
    let mut ids = HashMap::with_capacity(resources.len());
    for (idx, resource) in resources.iter().enumerate() {
        validation::validate_resource(resource).map_err(LevelingError::InvalidInput)?;
        if ids.insert(resource.id.as_str(), idx).is_some() {
            return Err(LevelingError::InvalidInput(format!(
                "duplicate resource id '{}'",
                resource.id
            )));
        }
    }
    Ok(ids)
}

fn load_span(assignment: &ResourceAssignment, axis: &DateAxis<'_>, anchor: i64, duration: i64) -> LoadSpan {
    let length = duration.max(1);
    match (assignment.start, assignment.finish) {
        (None, None) => LoadSpan::Activity,
        (Some(start), Some(finish)) => LoadSpan::Fixed {
            first: axis.offset(start),
            last: axis.last_offset_until(finish),
            anchor,
        },
        (Some(start), None) => {
            let first = axis.offset(start);
            LoadSpan::Fixed {
                first,
                last: first + length - 1,
                anchor,
            }
        }
        (None, Some(finish)) => {
            let last = axis.last_offset_until(finish);
            LoadSpan::Fixed {
                first: last - length + 1,
                last,
                anchor,
            }
        }
    }
}
