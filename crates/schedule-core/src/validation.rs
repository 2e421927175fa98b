use crate::activity::{Activity, ActivityId, Dependency};
use crate::error::{ScheduleCalculationReason, ScheduleError};
use crate::resource::{Resource, ResourceAssignment};
use std::collections::HashSet;

const EPSILON: f64 = 1e-6;

pub fn validate_activity(activity: &Activity) -> Result<(), ScheduleError> {
    if activity.duration_days < 0 {
        return Err(ScheduleError::calculation(
            ScheduleCalculationReason::NegativeDuration,
            format!(
                "activity {} has negative duration {}",
                activity.id, activity.duration_days
            ),
        ));
    }
    Ok(())
}

pub fn validate_activity_collection(activities: &[Activity]) -> Result<(), ScheduleError> {
    let mut seen_ids = HashSet::with_capacity(activities.len());
    for activity in activities {
        if !seen_ids.insert(activity.id) {
            return Err(ScheduleError::calculation(
                ScheduleCalculationReason::DuplicateActivity,
                format!("duplicate activity id {}", activity.id),
            ));
        }
        validate_activity(activity)?;
    }
    Ok(())
}

pub fn validate_dependencies(
    activities: &[Activity],
    dependencies: &[Dependency],
) -> Result<(), ScheduleError> {
    let known: HashSet<ActivityId> = activities.iter().map(|a| a.id).collect();
    for dependency in dependencies {
        for id in [dependency.predecessor_id, dependency.successor_id] {
            if !known.contains(&id) {
                return Err(ScheduleError::calculation(
                    ScheduleCalculationReason::UnknownActivity,
                    format!(
                        "dependency {} -> {} references unknown activity {}",
                        dependency.predecessor_id, dependency.successor_id, id
                    ),
                ));
            }
        }
    }
    Ok(())
}

/// Checks the numeric fields of an assignment. Dangling ids are not errors
/// here; leveling reports them as warnings and skips the assignment.
pub fn validate_assignment(assignment: &ResourceAssignment) -> Result<(), String> {
    if assignment.resource_id.trim().is_empty() {
        return Err(format!(
            "assignment on activity {} requires a non-empty resource_id",
            assignment.activity_id
        ));
    }
    if !assignment.units.is_finite() || assignment.units < -EPSILON {
        return Err(format!(
            "assignment of '{}' to activity {} has invalid units {}",
            assignment.resource_id, assignment.activity_id, assignment.units
        ));
    }
    if let (Some(start), Some(finish)) = (assignment.start, assignment.finish) {
        if finish < start {
            return Err(format!(
                "assignment of '{}' to activity {} finishes ({finish}) before it starts ({start})",
                assignment.resource_id, assignment.activity_id
            ));
        }
    }
    Ok(())
}

pub fn validate_resource(resource: &Resource) -> Result<(), String> {
    if resource.id.trim().is_empty() {
        return Err("resource requires a non-empty id".to_string());
    }
    if !resource.daily_capacity.is_finite() || resource.daily_capacity < 0.0 {
        return Err(format!(
            "resource '{}' has invalid daily_capacity {}",
            resource.id, resource.daily_capacity
        ));
    }
    for (date, capacity) in &resource.calendar.capacity_overrides {
        if !capacity.is_finite() || *capacity < 0.0 {
            return Err(format!(
                "resource '{}' has invalid capacity {} on {}",
                resource.id, capacity, date
            ));
        }
    }
    Ok(())
}
