//! Tabular views of engine results as polars frames.

use crate::activity::Activity;
use crate::calendar::WorkCalendar;
use crate::leveling::LevelingResult;
use crate::schedule::ScheduleResult;
use crate::simulation::{FinishSummary, SimulationOutput, TornadoBar};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashMap;

/// One row per activity with offsets, float and calendar dates.
pub fn schedule_frame(
    result: &ScheduleResult,
    activities: &[Activity],
    calendar: &WorkCalendar,
    project_start: NaiveDate,
) -> PolarsResult<DataFrame> {
    let names: HashMap<_, _> = activities.iter().map(|a| (a.id, a)).collect();
    let origin = calendar.first_available(project_start);

    let mut ids = Vec::with_capacity(result.len());
    let mut labels = Vec::with_capacity(result.len());
    let mut durations = Vec::with_capacity(result.len());
    let mut es = Vec::with_capacity(result.len());
    let mut ef = Vec::with_capacity(result.len());
    let mut ls = Vec::with_capacity(result.len());
    let mut lf = Vec::with_capacity(result.len());
    let mut tf = Vec::with_capacity(result.len());
    let mut ff = Vec::with_capacity(result.len());
    let mut critical = Vec::with_capacity(result.len());
    let mut start_dates = Vec::with_capacity(result.len());
    let mut finish_dates = Vec::with_capacity(result.len());

    for (&id, schedule) in &result.activities {
        let duration = schedule.early_finish - schedule.early_start;
        ids.push(id);
        labels.push(names.get(&id).map(|a| a.name.clone()).unwrap_or_default());
        durations.push(duration);
        es.push(schedule.early_start);
        ef.push(schedule.early_finish);
        ls.push(schedule.late_start);
        lf.push(schedule.late_finish);
        tf.push(schedule.total_float);
        ff.push(schedule.free_float);
        critical.push(schedule.is_critical);
        start_dates.push(calendar.date_for_offset(origin, schedule.early_start));
        finish_dates.push(calendar.finish_date(origin, schedule.early_start, duration));
    }

    DataFrame::new(vec![
        Series::new(PlSmallStr::from_static("id"), ids).into_column(),
        Series::new(PlSmallStr::from_static("name"), labels).into_column(),
        Series::new(PlSmallStr::from_static("duration_days"), durations).into_column(),
        Series::new(PlSmallStr::from_static("early_start"), es).into_column(),
        Series::new(PlSmallStr::from_static("early_finish"), ef).into_column(),
        Series::new(PlSmallStr::from_static("late_start"), ls).into_column(),
        Series::new(PlSmallStr::from_static("late_finish"), lf).into_column(),
        Series::new(PlSmallStr::from_static("total_float"), tf).into_column(),
        Series::new(PlSmallStr::from_static("free_float"), ff).into_column(),
        Series::new(PlSmallStr::from_static("is_critical"), critical).into_column(),
        series_from_dates("start_date", &start_dates)?.into_column(),
        series_from_dates("finish_date", &finish_dates)?.into_column(),
    ])
}

/// One row per shifted activity.
pub fn leveling_frame(result: &LevelingResult) -> PolarsResult<DataFrame> {
    let shifts = &result.shifts;
    let ids: Vec<i32> = shifts.iter().map(|s| s.activity_id).collect();
    let original_start: Vec<NaiveDate> = shifts.iter().map(|s| s.original_start).collect();
    let new_start: Vec<NaiveDate> = shifts.iter().map(|s| s.new_start).collect();
    let original_finish: Vec<NaiveDate> = shifts.iter().map(|s| s.original_finish).collect();
    let new_finish: Vec<NaiveDate> = shifts.iter().map(|s| s.new_finish).collect();
    let delay: Vec<i64> = shifts.iter().map(|s| s.delay_days).collect();
    let reason: Vec<String> = shifts.iter().map(|s| s.reason.clone()).collect();

    DataFrame::new(vec![
        Series::new(PlSmallStr::from_static("activity_id"), ids).into_column(),
        series_from_dates("original_start", &original_start)?.into_column(),
        series_from_dates("new_start", &new_start)?.into_column(),
        series_from_dates("original_finish", &original_finish)?.into_column(),
        series_from_dates("new_finish", &new_finish)?.into_column(),
        Series::new(PlSmallStr::from_static("delay_days"), delay).into_column(),
        Series::new(PlSmallStr::from_static("reason"), reason).into_column(),
    ])
}

/// Per-activity risk figures from a simulation run.
pub fn simulation_frame(output: &SimulationOutput) -> PolarsResult<DataFrame> {
    let ids: Vec<i32> = output.criticality.keys().copied().collect();
    let criticality: Vec<f64> = ids.iter().map(|id| output.criticality_of(*id)).collect();
    let sensitivity: Vec<f64> = ids.iter().map(|id| output.sensitivity_of(*id)).collect();
    let finish = |pick: fn(&FinishSummary) -> f64| -> Vec<f64> {
        ids.iter()
            .map(|id| output.finish_percentiles.get(id).map(pick).unwrap_or(0.0))
            .collect()
    };
    let p50 = finish(|f| f.p50);
    let p80 = finish(|f| f.p80);
    let p90 = finish(|f| f.p90);
    let mean = finish(|f| f.mean);
    let ranges: Vec<_> = ids
        .iter()
        .map(|id| output.duration_ranges.get(id).copied().unwrap_or_default())
        .collect();

    DataFrame::new(vec![
        Series::new(PlSmallStr::from_static("activity_id"), ids.clone()).into_column(),
        Series::new(PlSmallStr::from_static("criticality_pct"), criticality).into_column(),
        Series::new(PlSmallStr::from_static("sensitivity"), sensitivity).into_column(),
        Series::new(PlSmallStr::from_static("finish_p50"), p50).into_column(),
        Series::new(PlSmallStr::from_static("finish_p80"), p80).into_column(),
        Series::new(PlSmallStr::from_static("finish_p90"), p90).into_column(),
        Series::new(PlSmallStr::from_static("finish_mean"), mean).into_column(),
        Series::new(
            PlSmallStr::from_static("duration_min"),
            ranges.iter().map(|r| r.min).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            PlSmallStr::from_static("duration_max"),
            ranges.iter().map(|r| r.max).collect::<Vec<_>>(),
        )
        .into_column(),
    ])
}

pub fn tornado_frame(bars: &[TornadoBar]) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        Series::new(
            PlSmallStr::from_static("activity_id"),
            bars.iter().map(|b| b.activity_id).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            PlSmallStr::from_static("correlation"),
            bars.iter().map(|b| b.correlation).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            PlSmallStr::from_static("low"),
            bars.iter().map(|b| b.low).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            PlSmallStr::from_static("high"),
            bars.iter().map(|b| b.high).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            PlSmallStr::from_static("impact"),
            bars.iter().map(|b| b.impact).collect::<Vec<_>>(),
        )
        .into_column(),
    ])
}

fn series_from_dates(name: &str, dates: &[NaiveDate]) -> PolarsResult<Series> {
    let data: Vec<i32> = dates.iter().map(|d| date_to_i32(*d)).collect();
    Series::new(name.into(), data).cast(&DataType::Date)
}

fn date_to_i32(date: NaiveDate) -> i32 {
    (date - NaiveDate::default()).num_days() as i32
}
