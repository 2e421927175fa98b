use crate::activity::ActivityId;
use crate::calendar::WorkCalendar;
use crate::leveling::state::LevelingState;
use crate::leveling::{LevelingError, LevelingInput, LevelingOptions};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub(crate) const CAPACITY_EPSILON: f64 = 1e-6;

/// A resource asked for more hours on one working day than it has.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverAllocation {
    pub resource_id: String,
    pub date: NaiveDate,
    /// Working-day offset of `date` from the project start.
    pub offset: i64,
    pub demand: f64,
    pub capacity: f64,
    pub activities: Vec<ActivityId>,
}

impl OverAllocation {
    pub fn excess(&self) -> f64 {
        self.demand - self.capacity
    }

    pub(crate) fn key(&self) -> (String, i64) {
        (self.resource_id.clone(), self.offset)
    }

    pub(crate) fn shift_reason(&self) -> String {
        format!(
            "resolve over-allocation of {} on {}",
            self.resource_id, self.date
        )
    }
}

/// Worst first: largest excess, then earliest day, then resource id.
pub(crate) fn worst_first(a: &OverAllocation, b: &OverAllocation) -> Ordering {
    b.excess()
        .total_cmp(&a.excess())
        .then(a.offset.cmp(&b.offset))
        .then_with(|| a.resource_id.cmp(&b.resource_id))
}

/// Conflict matrix order: earliest day, then most severe, then resource id.
pub(crate) fn earliest_first(a: &OverAllocation, b: &OverAllocation) -> Ordering {
    a.offset
        .cmp(&b.offset)
        .then(b.excess().total_cmp(&a.excess()))
        .then_with(|| a.resource_id.cmp(&b.resource_id))
}

/// Which working days an assignment occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoadSpan {
    /// The activity's own working days.
    Activity,
    /// Explicit inclusive offsets, fixed relative to the activity's
    /// unleveled start (`anchor`) and moved with any later delay.
    Fixed { first: i64, last: i64, anchor: i64 },
}

/// One assignment resolved against the network and the resource table.
#[derive(Debug, Clone)]
pub(crate) struct Load {
    pub node: usize,
    pub resource: usize,
    pub demand: f64,
    pub span: LoadSpan,
}

impl Load {
    /// Inclusive day range for an activity starting at `start`, if any.
    pub fn days(&self, start: i64, duration: i64) -> Option<(i64, i64)> {
        match self.span {
            LoadSpan::Activity => (duration > 0).then(|| (start, start + duration - 1)),
            LoadSpan::Fixed {
                first,
                last,
                anchor,
            } => {
                let delay = start - anchor;
                (last >= first).then(|| (first + delay, last + delay))
            }
        }
    }

    pub fn covers(&self, start: i64, duration: i64, offset: i64) -> bool {
        self.days(start, duration)
            .is_some_and(|(first, last)| (first..=last).contains(&offset))
    }
}

/// Working-day axis of one leveling run. Dates for non-negative offsets are
/// cached as they are walked.
#[derive(Debug, Clone)]
pub(crate) struct DateAxis<'a> {
    calendar: &'a WorkCalendar,
    origin: NaiveDate,
    forward: Vec<NaiveDate>,
}

impl<'a> DateAxis<'a> {
    pub fn new(calendar: &'a WorkCalendar, project_start: NaiveDate) -> Self {
        let origin = calendar.first_available(project_start);
        Self {
            calendar,
            origin,
            forward: vec![origin],
        }
    }

    pub fn date(&mut self, offset: i64) -> NaiveDate {
        if offset < 0 {
            return self.calendar.date_for_offset(self.origin, offset);
        }
        let idx = offset as usize;
        while self.forward.len() <= idx {
            let last = self.forward[self.forward.len() - 1];
            self.forward.push(self.calendar.next_available(last));
        }
        self.forward[idx]
    }

    pub fn calendar(&self) -> &'a WorkCalendar {
        self.calendar
    }

    /// Offset of the first working day on or after `date`.
    pub fn offset(&self, date: NaiveDate) -> i64 {
        self.calendar.offset_for_date(self.origin, date)
    }

    /// Offset of the last working day on or before `date`.
    pub fn last_offset_until(&self, date: NaiveDate) -> i64 {
        match date.succ_opt() {
            Some(next) => self.offset(next) - 1,
            None => self.offset(date),
        }
    }

    /// Date an activity occupying `start..start+duration` finishes on.
    pub fn finish_date(&mut self, start: i64, duration: i64) -> NaiveDate {
        self.date(if duration > 0 { start + duration - 1 } else { start })
    }
}

/// Over-allocations of the unleveled schedule, earliest first.
pub fn detect_over_allocations(
    input: &LevelingInput<'_>,
    options: &LevelingOptions,
) -> Result<Vec<OverAllocation>, LevelingError> {
    let mut state = LevelingState::new(input, options)?;
    let mut conflicts = state.conflicts();
    conflicts.sort_by(earliest_first);
    Ok(conflicts)
}
