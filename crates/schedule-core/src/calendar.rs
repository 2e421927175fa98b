use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    #[error("work calendar requires at least one working day")]
    NoWorkingDays,
}

/// Project working-day calendar. Schedule offsets count working days, so
/// offset `n` is the `n`-th working day on or after the project start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendar {
    holidays: HashSet<NaiveDate>,
    non_working_days: HashSet<Weekday>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCalendarConfig {
    working_days: Vec<Weekday>,
    #[serde(default)]
    holidays: Vec<NaiveDate>,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self {
            holidays: HashSet::new(),
            non_working_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
        }
    }
}

impl WorkCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn custom<I, J>(working_days: I, holidays: J) -> Result<Self, CalendarError>
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let config = WorkCalendarConfig::new(working_days, holidays)?;
        Self::from_config(&config)
    }

    pub fn from_config(config: &WorkCalendarConfig) -> Result<Self, CalendarError> {
        let working_set: HashSet<Weekday> = config.working_days.iter().copied().collect();
        if working_set.is_empty() {
            return Err(CalendarError::NoWorkingDays);
        }
        let non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !working_set.contains(day))
            .collect();

        Ok(Self {
            holidays: config.holidays.iter().copied().collect(),
            non_working_days,
        })
    }

    pub fn to_config(&self) -> WorkCalendarConfig {
        WorkCalendarConfig::from(self)
    }

    /// Add a single holiday
    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    /// Add multiple holidays at once
    pub fn add_holidays(&mut self, dates: &[NaiveDate]) {
        self.holidays.extend(dates);
    }

    /// Set custom working days (e.g., Mon-Sat for 6-day weeks)
    pub fn set_working_days(&mut self, days: &[Weekday]) -> Result<(), CalendarError> {
        if days.is_empty() {
            return Err(CalendarError::NoWorkingDays);
        }
        self.non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !days.contains(day))
            .collect();
        Ok(())
    }

    /// Check if a date is available for scheduling
    pub fn is_available(&self, date: NaiveDate) -> bool {
        !self.holidays.contains(&date) && !self.non_working_days.contains(&date.weekday())
    }

    /// The date itself when it is a working day, otherwise the next one.
    pub fn first_available(&self, from: NaiveDate) -> NaiveDate {
        let mut current = from;
        while !self.is_available(current) {
            current = current + Duration::days(1);
        }
        current
    }

    /// Find the next available date after a given date
    pub fn next_available(&self, from: NaiveDate) -> NaiveDate {
        self.first_available(from + Duration::days(1))
    }

    /// Find a date N available days ahead
    pub fn find_next_available(&self, from: NaiveDate, days_ahead: i64) -> NaiveDate {
        let mut current = from;
        let mut count = 0;

        while count < days_ahead {
            current = current + Duration::days(1);
            if self.is_available(current) {
                count += 1;
            }
        }
        current
    }

    /// Find a date N available days back (inverse of find_next_available)
    pub fn find_prev_available(&self, from: NaiveDate, days_back: i64) -> NaiveDate {
        let mut current = from;
        let mut count = 0;
        while count < days_back {
            current = current - Duration::days(1);
            if self.is_available(current) {
                count += 1;
            }
        }
        current
    }

    /// Date of working-day `offset` counted from `origin` (offset 0 is the
    /// first working day on or after `origin`).
    pub fn date_for_offset(&self, origin: NaiveDate, offset: i64) -> NaiveDate {
        let first = self.first_available(origin);
        if offset >= 0 {
            self.find_next_available(first, offset)
        } else {
            self.find_prev_available(first, -offset)
        }
    }

    /// Signed number of working days in `[first working day of origin, date)`.
    /// Inverse of [`Self::date_for_offset`] on working days; a non-working
    /// date maps to the offset of the next working day.
    pub fn offset_for_date(&self, origin: NaiveDate, date: NaiveDate) -> i64 {
        let first = self.first_available(origin);
        if date >= first {
            self.count_available_days(first, date - Duration::days(1))
        } else {
            -self.count_available_days(date, first - Duration::days(1))
        }
    }

    /// Calendar date on which an activity with the given start offset and
    /// duration finishes (its last working day; the start day for milestones).
    pub fn finish_date(&self, origin: NaiveDate, start_offset: i64, duration: i64) -> NaiveDate {
        let last = if duration > 0 {
            start_offset + duration - 1
        } else {
            start_offset
        };
        self.date_for_offset(origin, last)
    }

    /// Count available days in a date range
    pub fn count_available_days(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        let mut count = 0;
        let mut current = start;

        while current <= end {
            if self.is_available(current) {
                count += 1;
            }
            current = current + Duration::days(1);
        }
        count
    }
}

impl WorkCalendarConfig {
    pub fn new<I, J>(working_days: I, holidays: J) -> Result<Self, CalendarError>
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let mut working: Vec<Weekday> = working_days.into_iter().collect();
        if working.is_empty() {
            return Err(CalendarError::NoWorkingDays);
        }
        working.sort_by_key(|wd| wd.num_days_from_monday());
        working.dedup_by(|a, b| a.num_days_from_monday() == b.num_days_from_monday());

        let mut holidays: Vec<NaiveDate> = holidays.into_iter().collect();
        holidays.sort();
        holidays.dedup();

        Ok(Self {
            working_days: working,
            holidays,
        })
    }

    pub fn working_days(&self) -> &[Weekday] {
        &self.working_days
    }

    pub fn holidays(&self) -> &[NaiveDate] {
        &self.holidays
    }
}

impl Default for WorkCalendarConfig {
    fn default() -> Self {
        WorkCalendarConfig::from(&WorkCalendar::default())
    }
}

impl From<&WorkCalendar> for WorkCalendarConfig {
    fn from(calendar: &WorkCalendar) -> Self {
        let working = WorkCalendar::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !calendar.non_working_days.contains(day))
            .collect();

        let mut holidays: Vec<NaiveDate> = calendar.holidays.iter().copied().collect();
        holidays.sort();

        Self {
            working_days: working,
            holidays,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn offsets_skip_weekends() {
        let cal = WorkCalendar::default();
        // 2025-01-06 is a Monday
        assert_eq!(cal.date_for_offset(d(2025, 1, 6), 0), d(2025, 1, 6));
        assert_eq!(cal.date_for_offset(d(2025, 1, 6), 4), d(2025, 1, 10));
        assert_eq!(cal.date_for_offset(d(2025, 1, 6), 5), d(2025, 1, 13));
        // origin on a Saturday rolls forward to Monday
        assert_eq!(cal.date_for_offset(d(2025, 1, 4), 0), d(2025, 1, 6));
    }

    #[test]
    fn offset_for_date_inverts_date_for_offset() {
        let mut cal = WorkCalendar::default();
        cal.add_holiday(d(2025, 1, 8));
        let origin = d(2025, 1, 6);
        for offset in -7..20 {
            let date = cal.date_for_offset(origin, offset);
            assert_eq!(cal.offset_for_date(origin, date), offset, "offset {offset}");
        }
        // a weekend day maps to the following Monday's offset
        assert_eq!(cal.offset_for_date(origin, d(2025, 1, 11)), 4);
    }

    #[test]
    fn finish_date_is_last_working_day() {
        let cal = WorkCalendar::default();
        let origin = d(2025, 1, 6);
        assert_eq!(cal.finish_date(origin, 0, 5), d(2025, 1, 10));
        assert_eq!(cal.finish_date(origin, 3, 3), d(2025, 1, 13));
        assert_eq!(cal.finish_date(origin, 2, 0), d(2025, 1, 8));
    }

    #[test]
    fn empty_working_week_is_rejected() {
        assert_eq!(
            WorkCalendar::custom(Vec::<Weekday>::new(), Vec::new()),
            Err(CalendarError::NoWorkingDays)
        );
    }
}
