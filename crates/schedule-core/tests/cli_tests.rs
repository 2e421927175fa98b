#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use std::io::Write;
use tempfile::NamedTempFile;

const CLASH_PROJECT: &str = r#"{
    "metadata": {"project_name": "Yard", "project_start_date": "2025-01-06"},
    "activities": [
        {"id": 1, "name": "Pour", "duration_days": 5},
        {"id": 2, "name": "Forms", "duration_days": 2}
    ],
    "resources": [{"id": "crew", "name": "Concrete crew"}],
    "assignments": [
        {"activity_id": 1, "resource_id": "crew"},
        {"activity_id": 2, "resource_id": "crew"}
    ],
    "distributions": {"2": {"type": "uniform", "min": 1, "max": 4}}
}"#;

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.env_remove("SCHEDULE_ENGINE_ITERATIONS")
        .env_remove("SCHEDULE_ENGINE_SEED")
        .write_stdin(script.to_string())
        .assert()
}

fn temp_with(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

fn escaped(file: &NamedTempFile) -> String {
    file.path().to_string_lossy().replace('\\', "\\\\")
}

#[test]
fn cli_prints_help_and_rejects_unknown_commands() {
    run_cli("help\nfrobnicate\nquit\n")
        .success()
        .stdout(str_contains("level compare"))
        .stdout(str_contains("Unknown command. Type 'help'."));
}

#[test]
fn cli_loads_csv_network_and_reports_critical_path() {
    let activities = temp_with("id,name,duration_days\n1,Design,2\n2,Build,3\n3,Docs,1\n");
    let deps = temp_with("predecessor_id,successor_id,dependency_type,lag_days\n1,2,FS,0\n1,3,,\n");
    let script = format!(
        "load csv {} {}\ncpm\nquit\n",
        escaped(&activities),
        escaped(&deps)
    );
    run_cli(&script)
        .success()
        .stdout(str_contains("Project loaded with 3 activities."))
        .stdout(str_contains("Docs"))
        .stdout(str_contains("Critical path: 1 -> 2"));
}

#[test]
fn cli_compares_leveling_strategies() {
    let project = temp_with(CLASH_PROJECT);
    let script = format!("load json {}\nlevel compare\napply\nquit\n", escaped(&project));
    run_cli(&script)
        .success()
        .stdout(str_contains("serial leveling: 1 activities shifted"))
        .stdout(str_contains("Recommended: parallel"))
        .stdout(str_contains("Applied 2 start constraints from parallel leveling."));
}

#[test]
fn cli_simulates_and_ranks_sensitivity() {
    let project = temp_with(CLASH_PROJECT);
    let script = format!(
        "tornado\nload json {}\nsimulate 200 9\ntornado 1\nquit\n",
        escaped(&project)
    );
    run_cli(&script)
        .success()
        .stdout(str_contains("No simulation results. Run 'simulate' first."))
        .stdout(str_contains("200 iterations (seed 9)"))
        .stdout(str_contains("correlation"));
}

#[test]
fn cli_save_and_load_json_round_trip() {
    let source = temp_with(CLASH_PROJECT);
    let target = NamedTempFile::new().expect("create temp file");
    let script = format!(
        "load json {}\nsave json {}\nload json {}\nmeta\nquit\n",
        escaped(&source),
        escaped(&target),
        escaped(&target)
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Project saved to"), "{output}");
    assert!(output.contains("Project name       : Yard"), "{output}");
}

#[test]
fn cli_reports_bad_input_without_exiting() {
    run_cli("load json /definitely/not/here.json\nsimulate many\nlevel greedy\nquit\n")
        .success()
        .stdout(str_contains("Error loading project"))
        .stdout(str_contains("Invalid iterations"))
        .stdout(str_contains("unknown leveling algorithm 'greedy'"));
}
