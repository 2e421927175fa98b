use schedule_engine::{
    Activity, Dependency, DistributionSpec, DurationDistribution, MonteCarloEngine, Project,
    SimulationConfig, SimulationError, calculate_schedule, tornado,
};
use std::collections::BTreeMap;

fn chain() -> (Vec<Activity>, Vec<Dependency>) {
    (
        vec![Activity::new(1, "Survey", 3), Activity::new(2, "Excavate", 6)],
        vec![Dependency::new(1, 2)],
    )
}

fn uncertain_excavation() -> BTreeMap<i32, DurationDistribution> {
    BTreeMap::from([(2, DurationDistribution::Uniform { min: 2.0, max: 10.0 })])
}

fn config(iterations: usize, seed: u64) -> SimulationConfig {
    SimulationConfig::default()
        .with_iterations(iterations)
        .with_seed(seed)
}

#[test]
fn fixed_durations_reproduce_the_cpm_schedule() {
    let activities = vec![
        Activity::new(1, "A", 2),
        Activity::new(2, "B", 3),
        Activity::new(3, "C", 1),
        Activity::new(4, "D", 2),
    ];
    let deps = vec![
        Dependency::new(1, 2),
        Dependency::new(1, 3),
        Dependency::new(2, 4),
        Dependency::new(3, 4),
    ];
    let mut distributions = BTreeMap::new();
    distributions.insert(3, DurationDistribution::constant(1.0));
    let cpm = calculate_schedule(&activities, &deps).unwrap();

    let output = MonteCarloEngine::new(&activities, &deps, &distributions, config(200, 7))
        .unwrap()
        .run();

    assert_eq!(output.iterations, 200);
    assert_eq!(output.seed, 7);
    assert_eq!(output.deterministic_duration, cpm.project_duration);
    assert!(output.project_durations.iter().all(|&d| d == 7.0));
    assert_eq!(output.std_dev, 0.0);
    assert_eq!(output.percentiles.p10, 7.0);
    assert_eq!(output.percentiles.p90, 7.0);
    assert_eq!(output.fallback_count, 0);
    assert_eq!(output.criticality_of(2), 100.0);
    assert_eq!(output.criticality_of(3), 0.0);
    assert_eq!(output.sensitivity_of(3), 0.0);
    assert_eq!(output.finish_percentiles[&4].p50, 7.0);
    assert_eq!(output.histogram.len(), 1);
    assert_eq!(output.histogram[0].count, 200);
}

#[test]
fn same_seed_gives_identical_runs() {
    let (activities, deps) = chain();
    let run = |seed| {
        MonteCarloEngine::new(&activities, &deps, &uncertain_excavation(), config(300, seed))
            .unwrap()
            .run()
    };
    let first = run(42);
    let second = run(42);
    assert_eq!(first.project_durations, second.project_durations);
    assert_eq!(first.percentiles, second.percentiles);
    assert_eq!(first.sensitivity, second.sensitivity);
    assert_ne!(first.project_durations, run(43).project_durations);
}

#[test]
fn statistics_are_consistent() {
    let (activities, deps) = chain();
    let output = MonteCarloEngine::new(&activities, &deps, &uncertain_excavation(), config(2000, 11))
        .unwrap()
        .run();

    let p = output.percentiles;
    assert!(output.min <= p.p10 && p.p10 <= p.p50 && p.p50 <= p.p80 && p.p80 <= p.p90);
    assert!(p.p90 <= output.max);
    assert!(output.min >= 5.0 && output.max <= 13.0);
    assert!((output.mean - 9.0).abs() < 0.5, "mean {}", output.mean);
    assert!(output.std_dev > 0.0);

    let binned: usize = output.histogram.iter().map(|bin| bin.count).sum();
    assert_eq!(binned, 2000);

    assert_eq!(output.probability_of_completion(13.0), 1.0);
    assert_eq!(output.probability_of_completion(4.0), 0.0);
    let p50 = output.percentile(50.0).unwrap();
    assert!(output.probability_of_completion(p50) >= 0.5);

    let range = output.duration_ranges[&2];
    assert!(range.min >= 2.0 && range.max <= 10.0);
    assert_eq!(output.duration_ranges[&1].min, 3.0);
}

#[test]
fn sensitivity_tracks_the_only_uncertain_activity() {
    let (activities, deps) = chain();
    let output = MonteCarloEngine::new(&activities, &deps, &uncertain_excavation(), config(1000, 3))
        .unwrap()
        .run();

    assert!(output.sensitivity_of(2) > 0.95, "{}", output.sensitivity_of(2));
    assert_eq!(output.sensitivity_of(1), 0.0);
    assert_eq!(output.criticality_of(1), 100.0);

    let bars = tornado(&output, None);
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].activity_id, 2);
    assert!(bars[0].impact > 0.0);
    assert!(bars[0].low < bars[0].high);
    assert_eq!(bars[1].impact, 0.0);
    assert_eq!(tornado(&output, Some(1)).len(), 1);
}

#[test]
fn parallel_branches_share_criticality() {
    let activities = vec![Activity::new(1, "Fixed", 5), Activity::new(2, "Risky", 5)];
    let distributions = BTreeMap::from([(
        2,
        DurationDistribution::Triangular {
            min: 1.0,
            mode: 5.0,
            max: 9.0,
        },
    )]);
    let output = MonteCarloEngine::new(&activities, &[], &distributions, config(500, 5))
        .unwrap()
        .run();

    let fixed = output.criticality_of(1);
    let risky = output.criticality_of(2);
    assert!(fixed > 0.0 && fixed < 100.0, "{fixed}");
    assert!(risky > 0.0 && risky < 100.0, "{risky}");
    assert!(fixed + risky >= 100.0);
}

#[test]
fn bad_inputs_are_rejected_up_front() {
    let (activities, deps) = chain();

    let unknown = BTreeMap::from([(99, DurationDistribution::constant(1.0))]);
    assert!(matches!(
        MonteCarloEngine::new(&activities, &deps, &unknown, config(10, 1)),
        Err(SimulationError::UnknownActivity(99))
    ));

    let inverted = BTreeMap::from([(1, DurationDistribution::Uniform { min: 5.0, max: 1.0 })]);
    assert!(matches!(
        MonteCarloEngine::new(&activities, &deps, &inverted, config(10, 1)),
        Err(SimulationError::InvalidDistribution { activity_id: 1, .. })
    ));

    let bad_lambda = SimulationConfig {
        pert_lambda: 0.0,
        ..config(10, 1)
    };
    assert!(matches!(
        MonteCarloEngine::new(&activities, &deps, &BTreeMap::new(), bad_lambda),
        Err(SimulationError::InvalidConfig(_))
    ));

    let cyclic = vec![Dependency::new(1, 2), Dependency::new(2, 1)];
    assert!(matches!(
        MonteCarloEngine::new(&activities, &cyclic, &BTreeMap::new(), config(10, 1)),
        Err(SimulationError::Schedule(_))
    ));
}

#[test]
fn loose_specs_convert_to_distributions() {
    let spec: DistributionSpec =
        serde_json::from_str(r#"{"kind":"BETA_PERT","min":2,"mode":4,"max":12}"#).unwrap();
    let dist = DurationDistribution::try_from(spec).unwrap();
    assert_eq!(
        dist,
        DurationDistribution::Pert {
            min: 2.0,
            mode: 4.0,
            max: 12.0
        }
    );
    assert_eq!(dist.mean(4.0), 5.0);

    let missing = DistributionSpec {
        kind: "normal".into(),
        mean: Some(3.0),
        ..DistributionSpec::default()
    };
    assert!(DurationDistribution::try_from(missing).is_err());
}

#[test]
fn project_simulation_uses_its_config() {
    let (activities, dependencies) = chain();
    let mut project = Project {
        activities,
        dependencies,
        distributions: uncertain_excavation(),
        ..Project::default()
    };
    project.config.simulation = config(150, 99);

    let first = project.simulate().unwrap();
    let second = project.simulate().unwrap();
    assert_eq!(first.iterations, 150);
    assert_eq!(first.project_durations, second.project_durations);
}
