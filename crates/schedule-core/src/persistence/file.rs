use super::{PersistenceError, PersistenceResult};
use crate::{
    Project,
    activity::{Activity, ActivityId, Dependency, DependencyType},
    resource::{Resource, ResourceAssignment},
    schedule::ScheduleResult,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

pub fn save_project_to_json<P: AsRef<Path>>(project: &Project, path: P) -> PersistenceResult<()> {
    super::validate_project(project)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, project)?;
    Ok(())
}

pub fn load_project_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Project> {
    let file = File::open(path)?;
    let project: Project = serde_json::from_reader(file)?;
    super::validate_project(&project)?;
    Ok(project)
}

/// Writes any engine result (schedule, leveling, simulation) as pretty JSON.
pub fn save_results_to_json<T: Serialize, P: AsRef<Path>>(results: &T, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, results)?;
    Ok(())
}

#[derive(Default, Serialize, Deserialize)]
struct ActivityCsvRecord {
    id: i32,
    #[serde(default)]
    name: String,
    duration_days: i64,
}

#[derive(Default, Serialize, Deserialize)]
struct DependencyCsvRecord {
    predecessor_id: i32,
    successor_id: i32,
    #[serde(default)]
    dependency_type: String,
    #[serde(default)]
    lag_days: String,
}

impl DependencyCsvRecord {
    fn into_dependency(self) -> PersistenceResult<Dependency> {
        let dependency_type: DependencyType = self
            .dependency_type
            .parse()
            .map_err(|err| PersistenceError::InvalidData(format!("{err}")))?;
        let lag_days = parse_i64(&self.lag_days)?.unwrap_or(0);
        Ok(Dependency::new(self.predecessor_id, self.successor_id)
            .with_type(dependency_type)
            .with_lag(lag_days))
    }
}

#[derive(Default, Serialize, Deserialize)]
struct ResourceCsvRecord {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    daily_capacity: String,
}

#[derive(Default, Serialize, Deserialize)]
struct AssignmentCsvRecord {
    activity_id: i32,
    resource_id: String,
    #[serde(default)]
    units: String,
    #[serde(default)]
    start: String,
    #[serde(default)]
    finish: String,
}

impl AssignmentCsvRecord {
    fn into_assignment(self) -> PersistenceResult<ResourceAssignment> {
        let units = parse_f64(&self.units)?.unwrap_or(1.0);
        let mut assignment = ResourceAssignment::new(self.activity_id, self.resource_id, units);
        assignment.start = parse_date(&self.start)?;
        assignment.finish = parse_date(&self.finish)?;
        Ok(assignment)
    }
}

#[derive(Serialize)]
struct ScheduleCsvRecord {
    id: ActivityId,
    early_start: i64,
    early_finish: i64,
    late_start: i64,
    late_finish: i64,
    total_float: i64,
    free_float: i64,
    is_critical: bool,
}

/// Columns: `id,name,duration_days`.
pub fn load_activities_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Activity>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut activities = Vec::new();
    for record in reader.deserialize::<ActivityCsvRecord>() {
        let record = record?;
        activities.push(Activity::new(record.id, record.name, record.duration_days));
    }
    if activities.is_empty() {
        return Err(PersistenceError::InvalidData(
            "CSV file contained no activities".into(),
        ));
    }
    Ok(activities)
}

/// Columns: `predecessor_id,successor_id,dependency_type,lag_days`; blank
/// type means FS and blank lag means 0.
pub fn load_dependencies_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Dependency>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    reader
        .deserialize::<DependencyCsvRecord>()
        .map(|record| record?.into_dependency())
        .collect()
}

/// Columns: `id,name,daily_capacity`; blank capacity means 8 hours.
pub fn load_resources_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Resource>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut resources = Vec::new();
    for record in reader.deserialize::<ResourceCsvRecord>() {
        let record = record?;
        let mut resource = Resource::new(record.id, record.name);
        if let Some(capacity) = parse_f64(&record.daily_capacity)? {
            resource.daily_capacity = capacity;
        }
        resources.push(resource);
    }
    Ok(resources)
}

/// Columns: `activity_id,resource_id,units,start,finish`; dates are optional.
pub fn load_assignments_from_csv<P: AsRef<Path>>(
    path: P,
) -> PersistenceResult<Vec<ResourceAssignment>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    reader
        .deserialize::<AssignmentCsvRecord>()
        .map(|record| record?.into_assignment())
        .collect()
}

pub fn save_schedule_to_csv<P: AsRef<Path>>(result: &ScheduleResult, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for (&id, schedule) in &result.activities {
        writer.serialize(ScheduleCsvRecord {
            id,
            early_start: schedule.early_start,
            early_finish: schedule.early_finish,
            late_start: schedule.late_start,
            late_finish: schedule.late_finish,
            total_float: schedule.total_float,
            free_float: schedule.free_float,
            is_critical: schedule.is_critical,
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn parse_date(input: &str) -> PersistenceResult<Option<NaiveDate>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}

fn parse_f64(input: &str) -> PersistenceResult<Option<f64>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid float '{input}': {e}")))
}

fn parse_i64(input: &str) -> PersistenceResult<Option<i64>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<i64>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid integer '{input}': {e}")))
}
