use crate::activity::ActivityId;
use crate::calendar::WorkCalendar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_daily_capacity() -> f64 {
    8.0
}

/// Explicit per-date capacity entries. Dates without an entry fall back to the
/// project's working week.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceCalendar {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub capacity_overrides: BTreeMap<NaiveDate, f64>,
}

impl ResourceCalendar {
    pub fn set_capacity(&mut self, date: NaiveDate, capacity: f64) {
        self.capacity_overrides.insert(date, capacity);
    }
}

/// A person, crew or piece of equipment that activities draw capacity from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Hours available on a standard working day.
    #[serde(default = "default_daily_capacity")]
    pub daily_capacity: f64,
    #[serde(default)]
    pub calendar: ResourceCalendar,
}

impl Resource {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            daily_capacity: default_daily_capacity(),
            calendar: ResourceCalendar::default(),
        }
    }

    pub fn with_daily_capacity(mut self, daily_capacity: f64) -> Self {
        self.daily_capacity = daily_capacity;
        self
    }

    pub fn with_capacity_on(mut self, date: NaiveDate, capacity: f64) -> Self {
        self.calendar.set_capacity(date, capacity);
        self
    }

    /// Capacity on `date`: the override if one exists, otherwise the daily
    /// capacity on working days of `work_calendar` and nothing on other days.
    pub fn available_capacity(&self, date: NaiveDate, work_calendar: &WorkCalendar) -> f64 {
        if let Some(capacity) = self.calendar.capacity_overrides.get(&date) {
            return *capacity;
        }
        if work_calendar.is_available(date) {
            self.daily_capacity
        } else {
            0.0
        }
    }
}

/// Allocation of a resource to an activity. `units` is the fraction of the
/// resource's daily capacity consumed on each working day of the activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAssignment {
    pub activity_id: ActivityId,
    pub resource_id: String,
    #[serde(default = "default_units")]
    pub units: f64,
    /// Inclusive explicit dates overriding the activity's computed dates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<NaiveDate>,
}

fn default_units() -> f64 {
    1.0
}

impl ResourceAssignment {
    pub fn new(activity_id: ActivityId, resource_id: impl Into<String>, units: f64) -> Self {
        Self {
            activity_id,
            resource_id: resource_id.into(),
            units,
            start: None,
            finish: None,
        }
    }

    pub fn with_dates(mut self, start: NaiveDate, finish: NaiveDate) -> Self {
        self.start = Some(start);
        self.finish = Some(finish);
        self
    }

    /// Hours drawn from `resource` on each day the assignment is active.
    pub fn demand(&self, resource: &Resource) -> f64 {
        self.units * resource.daily_capacity
    }
}
