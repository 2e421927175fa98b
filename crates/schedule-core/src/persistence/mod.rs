use crate::Project;
use crate::graph::ScheduleDag;
use crate::validation;
use serde_json::Error as SerdeJsonError;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum PersistenceError {
    Serialization(SerdeJsonError),
    Io(io::Error),
    Csv(csv::Error),
    InvalidData(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Serialization(err) => write!(f, "serialization error: {err}"),
            PersistenceError::Io(err) => write!(f, "io error: {err}"),
            PersistenceError::Csv(err) => write!(f, "csv error: {err}"),
            PersistenceError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::Serialization(err) => Some(err),
            PersistenceError::Io(err) => Some(err),
            PersistenceError::Csv(err) => Some(err),
            PersistenceError::InvalidData(_) => None,
        }
    }
}

impl From<SerdeJsonError> for PersistenceError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Serialization(value)
    }
}

impl From<io::Error> for PersistenceError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for PersistenceError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Structural checks every loaded project must pass: a buildable network,
/// a usable calendar, valid resources and assignments, and distributions
/// that point at real activities.
pub fn validate_project(project: &Project) -> PersistenceResult<()> {
    let invalid = |msg: String| PersistenceError::InvalidData(msg);
    let dag = ScheduleDag::build(&project.activities, &project.dependencies)
        .map_err(|err| invalid(err.to_string()))?;
    project.work_calendar().map_err(|err| invalid(err.to_string()))?;
    for resource in &project.resources {
        validation::validate_resource(resource).map_err(invalid)?;
    }
    for assignment in &project.assignments {
        validation::validate_assignment(assignment).map_err(invalid)?;
    }
    for (activity_id, distribution) in &project.distributions {
        if dag.index_of(*activity_id).is_none() {
            return Err(invalid(format!(
                "distribution given for unknown activity {activity_id}"
            )));
        }
        distribution
            .validate()
            .map_err(|err| invalid(format!("activity {activity_id}: {err}")))?;
    }
    Ok(())
}

pub mod file;

pub use file::{
    load_activities_from_csv, load_assignments_from_csv, load_dependencies_from_csv,
    load_project_from_json, load_resources_from_csv, save_project_to_json, save_results_to_json,
    save_schedule_to_csv,
};
