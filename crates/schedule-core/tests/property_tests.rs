use chrono::NaiveDate;
use proptest::prelude::*;
use schedule_engine::{
    Activity, Dependency, DurationDistribution, LevelingAlgorithm, LevelingInput,
    LevelingOptions, MonteCarloEngine, Resource, ResourceAssignment, SimulationConfig,
    WorkCalendar, calculate_schedule, detect_over_allocations, level_resources,
};
use std::collections::BTreeMap;

/// Forward-only edges keep every generated network acyclic.
fn network(durations: &[i64], edges: &[(usize, usize, i64)]) -> (Vec<Activity>, Vec<Dependency>) {
    let n = durations.len();
    let activities = durations
        .iter()
        .enumerate()
        .map(|(i, &d)| Activity::new(i as i32 + 1, format!("A{i}"), d))
        .collect();
    let deps = edges
        .iter()
        .filter(|(a, b, _)| a < b && *b < n)
        .map(|&(a, b, lag)| Dependency::new(a as i32 + 1, b as i32 + 1).with_lag(lag))
        .collect();
    (activities, deps)
}

fn edges() -> impl Strategy<Value = Vec<(usize, usize, i64)>> {
    prop::collection::vec((0usize..8, 0usize..8, 0i64..3), 0..14)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn cpm_dates_are_consistent(
        durations in prop::collection::vec(0i64..10, 1..8),
        edges in edges(),
    ) {
        let (activities, deps) = network(&durations, &edges);
        let result = calculate_schedule(&activities, &deps).unwrap();

        let max_finish = result.activities.values().map(|s| s.early_finish).max().unwrap_or(0);
        prop_assert_eq!(result.project_duration, max_finish);
        prop_assert!(!result.critical_path.is_empty());

        for activity in &activities {
            let s = result.get(activity.id).unwrap();
            prop_assert!(s.early_start >= 0);
            prop_assert_eq!(s.early_finish - s.early_start, activity.duration_days);
            prop_assert_eq!(s.late_finish - s.late_start, activity.duration_days);
            prop_assert!(s.total_float >= 0);
            prop_assert!(s.free_float >= 0 && s.free_float <= s.total_float);
            prop_assert!(s.late_finish <= result.project_duration);
            prop_assert_eq!(s.is_critical, s.total_float == 0);
        }
        for dep in &deps {
            let pred = result.get(dep.predecessor_id).unwrap();
            let succ = result.get(dep.successor_id).unwrap();
            prop_assert!(succ.early_start >= pred.early_finish + dep.lag_days);
            prop_assert!(succ.late_start >= pred.late_finish + dep.lag_days);
        }
    }

    #[test]
    fn leveled_schedules_stay_feasible(
        durations in prop::collection::vec(1i64..6, 2..7),
        edges in edges(),
        units in prop::collection::vec(0.25f64..1.0, 2..7),
        parallel in any::<bool>(),
    ) {
        let (activities, deps) = network(&durations, &edges);
        let resources = vec![Resource::new("crew", "Crew")];
        let assignments: Vec<_> = activities
            .iter()
            .zip(&units)
            .map(|(a, &u)| ResourceAssignment::new(a.id, "crew", u))
            .collect();
        let calendar = WorkCalendar::default();
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let input = LevelingInput::new(&activities, &deps, &resources, &assignments, &calendar, start);
        let options = LevelingOptions {
            preserve_critical_path: false,
            ..LevelingOptions::default()
        };
        let algorithm = if parallel { LevelingAlgorithm::Parallel } else { LevelingAlgorithm::Serial };

        let result = level_resources(&input, &options, algorithm).unwrap();
        let cpm = calculate_schedule(&activities, &deps).unwrap();

        prop_assert_eq!(result.success, result.remaining_over_allocations.is_empty());
        prop_assert!(result.iterations <= options.max_iterations);
        prop_assert!(result.new_duration_days >= result.original_duration_days);
        prop_assert!(result.shifts.iter().all(|s| s.delay_days > 0));
        for activity in &activities {
            prop_assert!(result.leveled_starts[&activity.id] >= cpm.get(activity.id).unwrap().early_start);
        }
        for dep in &deps {
            let pred = result.leveled_starts[&dep.predecessor_id];
            let pred_duration = activities[(dep.predecessor_id - 1) as usize].duration_days;
            prop_assert!(result.leveled_starts[&dep.successor_id] >= pred + pred_duration + dep.lag_days);
        }

        if result.success {
            let constraints = result.start_constraints();
            let replay = input.with_start_constraints(&constraints);
            prop_assert!(detect_over_allocations(&replay, &options).unwrap().is_empty());
        }
    }

    #[test]
    fn simulated_durations_respect_distribution_bounds(
        low in 1.0f64..5.0,
        mode_share in 0.0f64..1.0,
        spread in 0.5f64..8.0,
        seed in any::<u64>(),
    ) {
        let high = low + spread;
        let mode = low + mode_share * spread;
        let activities = vec![
            Activity::new(1, "T", 1),
            Activity::new(2, "P", 1),
            Activity::new(3, "U", 1),
        ];
        let deps = vec![Dependency::new(1, 2), Dependency::new(2, 3)];
        let distributions = BTreeMap::from([
            (1, DurationDistribution::Triangular { min: low, mode, max: high }),
            (2, DurationDistribution::Pert { min: low, mode, max: high }),
            (3, DurationDistribution::Uniform { min: low, max: high }),
        ]);
        let config = SimulationConfig::default().with_iterations(64).with_seed(seed);
        let output = MonteCarloEngine::new(&activities, &deps, &distributions, config)
            .unwrap()
            .run();

        for id in 1..=3 {
            let range = output.duration_ranges[&id];
            prop_assert!(range.min >= low - 1e-9 && range.max <= high + 1e-9);
            prop_assert_eq!(output.criticality_of(id), 100.0);
        }
        let lowest = 3.0 * low.round();
        let highest = 3.0 * high.round();
        prop_assert!(output.min >= lowest && output.max <= highest);
        let p = output.percentiles;
        prop_assert!(p.p10 <= p.p50 && p.p50 <= p.p80 && p.p80 <= p.p90);
    }
}
