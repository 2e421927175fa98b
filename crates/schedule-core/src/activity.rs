use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type ActivityId = i32;

/// A unit of work in the dependency network. Schedule dates are never stored
/// here; they live in [`crate::ScheduleResult`] and are recomputed per pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    #[serde(default)]
    pub name: String,
    pub duration_days: i64,
}

impl Activity {
    pub fn new(id: ActivityId, name: impl Into<String>, duration_days: i64) -> Self {
        Self {
            id,
            name: name.into(),
            duration_days,
        }
    }

    pub fn is_milestone(&self) -> bool {
        self.duration_days == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DependencyType {
    #[default]
    #[serde(rename = "FS", alias = "finish_to_start")]
    FinishToStart,
    #[serde(rename = "SS", alias = "start_to_start")]
    StartToStart,
    #[serde(rename = "FF", alias = "finish_to_finish")]
    FinishToFinish,
    #[serde(rename = "SF", alias = "start_to_finish")]
    StartToFinish,
}

impl DependencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::FinishToStart => "FS",
            DependencyType::StartToStart => "SS",
            DependencyType::FinishToFinish => "FF",
            DependencyType::StartToFinish => "SF",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDependencyType(pub String);

impl fmt::Display for UnknownDependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown dependency type '{}'", self.0)
    }
}

impl std::error::Error for UnknownDependencyType {}

impl FromStr for DependencyType {
    type Err = UnknownDependencyType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "fs" | "finish_to_start" => Ok(DependencyType::FinishToStart),
            "ss" | "start_to_start" => Ok(DependencyType::StartToStart),
            "ff" | "finish_to_finish" => Ok(DependencyType::FinishToFinish),
            "sf" | "start_to_finish" => Ok(DependencyType::StartToFinish),
            _ => Err(UnknownDependencyType(value.to_string())),
        }
    }
}

/// Directed link `predecessor -> successor`. A negative lag is a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub predecessor_id: ActivityId,
    pub successor_id: ActivityId,
    #[serde(default)]
    pub dependency_type: DependencyType,
    #[serde(default)]
    pub lag_days: i64,
}

impl Dependency {
    pub fn new(predecessor_id: ActivityId, successor_id: ActivityId) -> Self {
        Self {
            predecessor_id,
            successor_id,
            dependency_type: DependencyType::FinishToStart,
            lag_days: 0,
        }
    }

    pub fn with_type(mut self, dependency_type: DependencyType) -> Self {
        self.dependency_type = dependency_type;
        self
    }

    pub fn with_lag(mut self, lag_days: i64) -> Self {
        self.lag_days = lag_days;
        self
    }
}
