use chrono::NaiveDate;
use schedule_engine::{
    Activity, Dependency, DependencyType, DurationDistribution, PersistenceError, Project,
    Resource, ResourceAssignment, calculate_schedule, load_activities_from_csv,
    load_assignments_from_csv, load_dependencies_from_csv, load_project_from_json,
    load_resources_from_csv, save_project_to_json, save_results_to_json, save_schedule_to_csv,
    validate_project,
};
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

fn build_sample_project() -> Project {
    let mut project = Project {
        activities: vec![Activity::new(1, "Design", 5), Activity::new(2, "Build", 8)],
        dependencies: vec![
            Dependency::new(1, 2)
                .with_type(DependencyType::StartToStart)
                .with_lag(2),
        ],
        resources: vec![
            Resource::new("eng", "Engineer")
                .with_daily_capacity(6.0)
                .with_capacity_on(d(2025, 1, 8), 3.0),
        ],
        assignments: vec![
            ResourceAssignment::new(1, "eng", 1.0),
            ResourceAssignment::new(2, "eng", 0.5).with_dates(d(2025, 1, 13), d(2025, 1, 17)),
        ],
        ..Project::default()
    };
    project.metadata.project_name = "Export Project".into();
    project.metadata.project_start_date = d(2025, 1, 6);
    project.distributions.insert(
        2,
        DurationDistribution::Pert {
            min: 6.0,
            mode: 8.0,
            max: 14.0,
        },
    );
    project.start_constraints.insert(2, 4);
    project.config.simulation.seed = Some(17);
    project
}

#[test]
fn json_round_trip_preserves_project() {
    let project = build_sample_project();
    let tmp = NamedTempFile::new().expect("create temp file");

    save_project_to_json(&project, tmp.path()).expect("save project");
    let loaded = load_project_from_json(tmp.path()).expect("load project");

    assert_eq!(loaded, project);
}

#[test]
fn sparse_json_falls_back_to_defaults() {
    let file = write_temp(
        r#"{
            "activities": [{"id": 1, "duration_days": 3}, {"id": 2, "name": "Ship", "duration_days": 1}],
            "dependencies": [{"predecessor_id": 1, "successor_id": 2, "dependency_type": "finish_to_start"}],
            "distributions": {"1": {"type": "triangular", "min": 2, "mode": 3, "max": 6}},
            "config": {"simulation": {"iterations": 50}}
        }"#,
    );
    let project = load_project_from_json(file.path()).expect("load project");

    assert_eq!(project.metadata.project_start_date, d(2025, 1, 6));
    assert_eq!(project.activities[0].name, "");
    assert_eq!(project.config.simulation.iterations, 50);
    assert_eq!(project.config.simulation.pert_lambda, 4.0);
    assert_eq!(project.config.leveling.max_iterations, 100);
    assert_eq!(project.schedule().unwrap().project_duration, 4);
}

#[test]
fn invalid_projects_are_rejected_on_load_and_save() {
    let mut project = build_sample_project();
    project
        .distributions
        .insert(9, DurationDistribution::constant(1.0));
    assert!(matches!(
        validate_project(&project),
        Err(PersistenceError::InvalidData(_))
    ));
    let tmp = NamedTempFile::new().expect("create temp file");
    assert!(save_project_to_json(&project, tmp.path()).is_err());

    let cyclic = write_temp(
        r#"{"activities": [{"id": 1, "duration_days": 1}, {"id": 2, "duration_days": 1}],
            "dependencies": [{"predecessor_id": 1, "successor_id": 2}, {"predecessor_id": 2, "successor_id": 1}]}"#,
    );
    let err = load_project_from_json(cyclic.path()).unwrap_err();
    assert!(err.to_string().contains("circular"), "{err}");

    let broken = write_temp("{ not json");
    assert!(matches!(
        load_project_from_json(broken.path()),
        Err(PersistenceError::Serialization(_))
    ));
    assert!(matches!(
        load_project_from_json("/definitely/not/here.json"),
        Err(PersistenceError::Io(_))
    ));
}

#[test]
fn csv_loaders_fill_blank_columns() {
    let activities = write_temp("id,name,duration_days\n1,Design,5\n2,Build,8\n3,,0\n");
    let dependencies = write_temp(
        "predecessor_id,successor_id,dependency_type,lag_days\n1,2,SS,2\n2,3,,\n",
    );
    let resources = write_temp("id,name,daily_capacity\neng,Engineer,6\nqa,QA,\n");
    let assignments = write_temp(
        "activity_id,resource_id,units,start,finish\n1,eng,1,,\n2,qa,,2025-01-13,2025-01-17\n",
    );

    let activities = load_activities_from_csv(activities.path()).unwrap();
    assert_eq!(activities.len(), 3);
    assert!(activities[2].is_milestone());

    let dependencies = load_dependencies_from_csv(dependencies.path()).unwrap();
    assert_eq!(dependencies[0].dependency_type, DependencyType::StartToStart);
    assert_eq!(dependencies[0].lag_days, 2);
    assert_eq!(dependencies[1].dependency_type, DependencyType::FinishToStart);
    assert_eq!(dependencies[1].lag_days, 0);

    let resources = load_resources_from_csv(resources.path()).unwrap();
    assert_eq!(resources[0].daily_capacity, 6.0);
    assert_eq!(resources[1].daily_capacity, 8.0);

    let assignments = load_assignments_from_csv(assignments.path()).unwrap();
    assert_eq!(assignments[0].start, None);
    assert_eq!(assignments[1].units, 1.0);
    assert_eq!(assignments[1].start, Some(d(2025, 1, 13)));
    assert_eq!(assignments[1].finish, Some(d(2025, 1, 17)));
}

#[test]
fn csv_loaders_report_bad_values() {
    let empty = write_temp("id,name,duration_days\n");
    assert!(matches!(
        load_activities_from_csv(empty.path()),
        Err(PersistenceError::InvalidData(_))
    ));

    let bad_type = write_temp("predecessor_id,successor_id,dependency_type,lag_days\n1,2,XX,0\n");
    assert!(matches!(
        load_dependencies_from_csv(bad_type.path()),
        Err(PersistenceError::InvalidData(_))
    ));

    let bad_date = write_temp("activity_id,resource_id,units,start,finish\n1,eng,1,13/01/2025,\n");
    assert!(matches!(
        load_assignments_from_csv(bad_date.path()),
        Err(PersistenceError::InvalidData(_))
    ));

    let bad_number = write_temp("id,name,duration_days\n1,Design,five\n");
    assert!(matches!(
        load_activities_from_csv(bad_number.path()),
        Err(PersistenceError::Csv(_))
    ));
}

#[test]
fn schedule_and_results_are_written_out() {
    let project = build_sample_project();
    let result = calculate_schedule(&project.activities, &project.dependencies).unwrap();

    let csv_file = NamedTempFile::new().expect("create temp file");
    save_schedule_to_csv(&result, csv_file.path()).unwrap();
    let csv = fs::read_to_string(csv_file.path()).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("id,early_start,early_finish,late_start,late_finish,total_float,free_float,is_critical")
    );
    assert_eq!(lines.count(), 2);

    let json_file = NamedTempFile::new().expect("create temp file");
    save_results_to_json(&result, json_file.path()).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(json_file.path()).unwrap()).unwrap();
    assert_eq!(value["project_duration"], 10);
}
