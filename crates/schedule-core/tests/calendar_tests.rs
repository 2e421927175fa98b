use chrono::{Datelike, NaiveDate, Weekday};
use schedule_engine::{CalendarError, WorkCalendar, WorkCalendarConfig};

#[test]
fn default_calendar_weekends_unavailable() {
    let cal = WorkCalendar::default();
    // 2025-01-04 is a Saturday, 2025-01-05 is a Sunday
    let sat = NaiveDate::from_ymd_opt(2025, 1, 4).unwrap();
    let sun = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
    assert!(!cal.is_available(sat));
    assert!(!cal.is_available(sun));
}

#[test]
fn next_available_skips_weekend() {
    let cal = WorkCalendar::default();
    let fri = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();
    let next = cal.next_available(fri);
    assert_eq!(next.weekday(), Weekday::Mon);
    assert_eq!(next, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
}

#[test]
fn find_next_available_counts_only_workdays() {
    let cal = WorkCalendar::default();
    let mon = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    let four_ahead = cal.find_next_available(mon, 4);
    assert_eq!(four_ahead.weekday(), Weekday::Fri);
    assert_eq!(cal.find_prev_available(four_ahead, 4), mon);
}

#[test]
fn count_available_days_skips_weekends() {
    let cal = WorkCalendar::default();
    let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(); // Mon
    let end = NaiveDate::from_ymd_opt(2025, 1, 19).unwrap(); // Sun, two weeks later
    assert_eq!(cal.count_available_days(start, end), 10);
    // a weekend alone has no working days
    let saturday = NaiveDate::from_ymd_opt(2025, 1, 11).unwrap();
    assert_eq!(cal.count_available_days(saturday, saturday.succ_opt().unwrap()), 0);
}

#[test]
fn holidays_push_offsets_forward() {
    let mut cal = WorkCalendar::default();
    let origin = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    cal.add_holidays(&[
        NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 8).unwrap(),
    ]);
    // offsets 0..=2 are Mon, Thu, Fri
    assert_eq!(
        cal.date_for_offset(origin, 2),
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    );
    assert_eq!(
        cal.finish_date(origin, 0, 4),
        NaiveDate::from_ymd_opt(2025, 1, 13).unwrap()
    );
}

#[test]
fn set_working_days_includes_saturday() {
    let mut cal = WorkCalendar::default();
    cal.set_working_days(&[
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ])
    .unwrap();
    let sat = NaiveDate::from_ymd_opt(2025, 1, 4).unwrap();
    assert!(cal.is_available(sat));
    assert_eq!(cal.set_working_days(&[]), Err(CalendarError::NoWorkingDays));
}

#[test]
fn custom_calendar_builds_non_standard_week_and_round_trips() {
    let working = vec![
        Weekday::Sat,
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Mon,
    ];
    let holidays = vec![
        NaiveDate::from_ymd_opt(2025, 7, 3).unwrap(),
        NaiveDate::from_ymd_opt(2025, 6, 19).unwrap(),
    ];
    let cal = WorkCalendar::custom(working, holidays.clone()).unwrap();

    assert!(!cal.is_available(NaiveDate::from_ymd_opt(2025, 6, 20).unwrap())); // Friday
    assert!(!cal.is_available(NaiveDate::from_ymd_opt(2025, 6, 22).unwrap())); // Sunday
    assert!(cal.is_available(NaiveDate::from_ymd_opt(2025, 6, 21).unwrap())); // Saturday
    for holiday in &holidays {
        assert!(!cal.is_available(*holiday));
    }

    let config = cal.to_config();
    assert_eq!(
        config.working_days(),
        &[
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Sat
        ]
    );
    assert_eq!(
        config.holidays(),
        &[
            NaiveDate::from_ymd_opt(2025, 6, 19).unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 3).unwrap()
        ]
    );

    let recreated = WorkCalendar::from_config(&config).unwrap();
    assert_eq!(recreated.to_config(), config);
}

#[test]
fn config_deserializes_with_default_holidays() {
    let config: WorkCalendarConfig =
        serde_json::from_str(r#"{"working_days":["Mon","Wed","Fri"]}"#).unwrap();
    let cal = WorkCalendar::from_config(&config).unwrap();
    let origin = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    assert_eq!(
        cal.date_for_offset(origin, 3),
        NaiveDate::from_ymd_opt(2025, 1, 13).unwrap()
    );
}
