use polars::prelude::{AnyValue, DataFrame};
use schedule_engine::{
    EngineConfig, LevelingAlgorithm, LevelingResult, Project, SimulationOutput,
    load_activities_from_csv, load_assignments_from_csv, load_dependencies_from_csv,
    load_project_from_json, load_resources_from_csv, report, save_project_to_json,
    save_results_to_json, save_schedule_to_csv, tornado,
};
use std::io::{self, Write};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SCHEDULE_ENGINE_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn format_cell(av: &AnyValue) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::Float64(v) => format!("{v:.2}"),
        AnyValue::String(s) => s.to_string(),
        _ => av.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| col.get(row_idx).map(|av| format_cell(&av)).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &cells {
        for (ci, s) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(s.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let push_row = |out: &mut String, row: &[String]| {
        out.push('|');
        for (ci, s) in row.iter().enumerate() {
            out.push(' ');
            out.push_str(s);
            out.push_str(&" ".repeat(widths[ci].saturating_sub(s.len())));
            out.push_str(" |");
        }
        out.push('\n');
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_row(&mut out, &col_names);
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        push_row(&mut out, row);
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show the CPM schedule table\n  cpm                                Show the CPM summary\n  meta                               Show project metadata\n  level <serial|parallel>            Run resource leveling\n  level compare                      Run both strategies and recommend one\n  apply                              Keep the last leveling result as start constraints\n  simulate [iterations] [seed]       Run the Monte Carlo simulation\n  tornado [n]                        Rank activities by schedule sensitivity\n  load json <path>                   Load a project file\n  load csv <activities> [dependencies] [resources] [assignments]\n                                     Build a project from CSV files\n  save json <path>                   Persist the project\n  save csv <path>                    Persist the CPM schedule\n  save results <path>                Persist the last simulation output\n  quit|exit                          Exit"
    );
}

fn print_metadata(project: &Project) {
    let metadata = &project.metadata;
    println!("Project name       : {}", metadata.project_name);
    println!("Project description: {}", metadata.project_description);
    println!("Project start date : {}", metadata.project_start_date);
    println!("Activities         : {}", project.activities.len());
    println!("Resources          : {}", project.resources.len());
    println!("Distributions      : {}", project.distributions.len());
}

fn print_schedule(project: &Project) {
    let calendar = match project.work_calendar() {
        Ok(calendar) => calendar,
        Err(e) => {
            println!("Calendar error: {}", e);
            return;
        }
    };
    match project.schedule() {
        Ok(result) => {
            match report::schedule_frame(
                &result,
                &project.activities,
                &calendar,
                project.metadata.project_start_date,
            ) {
                Ok(df) => println!("{}", render_df_as_text_table(&df)),
                Err(e) => println!("Error building table: {}", e),
            }
            println!("{}", result.summary().to_cli_summary());
        }
        Err(e) => println!("Schedule error: {}", e),
    }
}

fn print_leveling(result: &LevelingResult) {
    println!(
        "{} leveling: {} activities shifted in {} iterations, finish {} -> {} ({:+} days), success={}",
        result.algorithm,
        result.activities_shifted,
        result.iterations,
        result.original_finish,
        result.new_finish,
        result.schedule_extension_days(),
        result.success
    );
    if !result.shifts.is_empty() {
        match report::leveling_frame(result) {
            Ok(df) => println!("{}", render_df_as_text_table(&df)),
            Err(e) => println!("Error building table: {}", e),
        }
    }
    for warning in &result.warnings {
        println!("warning: {}", warning);
    }
}

fn print_simulation(output: &SimulationOutput) {
    let p = &output.percentiles;
    println!(
        "{} iterations (seed {}) in {} ms; deterministic {} days",
        output.iterations, output.seed, output.elapsed_ms, output.deterministic_duration
    );
    println!(
        "P10 {:.1}  P50 {:.1}  P80 {:.1}  P90 {:.1}",
        p.p10, p.p50, p.p80, p.p90
    );
    println!(
        "mean {:.2}  std dev {:.2}  min {:.1}  max {:.1}",
        output.mean, output.std_dev, output.min, output.max
    );
    println!(
        "P(finish <= deterministic) = {:.1}%",
        output.probability_of_completion(output.deterministic_duration as f64) * 100.0
    );
    if output.fallback_count > 0 {
        println!("{} iterations fell back to summed durations", output.fallback_count);
    }
    match report::simulation_frame(output) {
        Ok(df) => println!("{}", render_df_as_text_table(&df)),
        Err(e) => println!("Error building table: {}", e),
    }
}

fn load_csv_project<'a>(mut paths: impl Iterator<Item = &'a str>) -> Result<Project, String> {
    let activities_path = paths
        .next()
        .ok_or_else(|| "Usage: load csv <activities> [dependencies] [resources] [assignments]".to_string())?;
    let mut project = Project {
        activities: load_activities_from_csv(activities_path).map_err(|e| e.to_string())?,
        ..Project::default()
    };
    if let Some(path) = paths.next() {
        project.dependencies = load_dependencies_from_csv(path).map_err(|e| e.to_string())?;
    }
    if let Some(path) = paths.next() {
        project.resources = load_resources_from_csv(path).map_err(|e| e.to_string())?;
    }
    if let Some(path) = paths.next() {
        project.assignments = load_assignments_from_csv(path).map_err(|e| e.to_string())?;
    }
    Ok(project)
}

/// Environment overrides win over whatever a loaded project file carries.
fn apply_env(config: &mut EngineConfig) {
    if let Err(e) = config.apply_env_overrides() {
        println!("Ignoring environment override: {}", e);
    }
}

fn main() {
    init_tracing();

    let mut project = Project::default();
    apply_env(&mut project.config);
    let mut last_leveling: Option<LevelingResult> = None;
    let mut last_simulation: Option<SimulationOutput> = None;

    println!("Schedule Engine (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "meta" => print_metadata(&project),
            "show" => print_schedule(&project),
            "cpm" => match project.schedule() {
                Ok(result) => {
                    println!("{}", result.summary().to_cli_summary());
                    let path = result
                        .critical_path
                        .iter()
                        .map(|id| id.to_string())
                        .collect::<Vec<_>>()
                        .join(" -> ");
                    println!("Critical path: {}", path);
                }
                Err(e) => println!("Schedule error: {}", e),
            },
            "level" => match parts.next() {
                Some("compare") => match project.compare_leveling() {
                    Ok(comparison) => {
                        print_leveling(&comparison.serial);
                        print_leveling(&comparison.parallel);
                        println!(
                            "Recommended: {} ({})",
                            comparison.recommended, comparison.reason
                        );
                        last_leveling = Some(comparison.recommended_result().clone());
                    }
                    Err(e) => println!("Leveling error: {}", e),
                },
                Some(name) => match LevelingAlgorithm::from_str(name) {
                    Ok(algorithm) => match project.level(algorithm) {
                        Ok(result) => {
                            print_leveling(&result);
                            last_leveling = Some(result);
                        }
                        Err(e) => println!("Leveling error: {}", e),
                    },
                    Err(e) => println!("{}", e),
                },
                None => println!("Usage: level <serial|parallel|compare>"),
            },
            "apply" => match &last_leveling {
                Some(result) => {
                    project.apply_leveling(result);
                    println!(
                        "Applied {} start constraints from {} leveling.",
                        project.start_constraints.len(),
                        result.algorithm
                    );
                }
                None => println!("No leveling result to apply. Run 'level' first."),
            },
            "simulate" => {
                let iterations = parts.next().map(str::parse::<usize>);
                let seed = parts.next().map(str::parse::<u64>);
                let mut run = project.clone();
                match iterations {
                    Some(Ok(n)) => run.config.simulation.iterations = n,
                    Some(Err(_)) => {
                        println!("Invalid iterations");
                        continue;
                    }
                    None => {}
                }
                match seed {
                    Some(Ok(s)) => run.config.simulation.seed = Some(s),
                    Some(Err(_)) => {
                        println!("Invalid seed");
                        continue;
                    }
                    None => {}
                }
                match run.simulate() {
                    Ok(output) => {
                        print_simulation(&output);
                        last_simulation = Some(output);
                    }
                    Err(e) => println!("Simulation error: {}", e),
                }
            }
            "tornado" => {
                let limit = match parts.next().map(str::parse::<usize>) {
                    Some(Ok(n)) => Some(n),
                    Some(Err(_)) => {
                        println!("Usage: tornado [n]");
                        continue;
                    }
                    None => None,
                };
                match &last_simulation {
                    Some(output) => match report::tornado_frame(&tornado(output, limit)) {
                        Ok(df) => println!("{}", render_df_as_text_table(&df)),
                        Err(e) => println!("Error building table: {}", e),
                    },
                    None => println!("No simulation results. Run 'simulate' first."),
                }
            }
            "save" => {
                let fmt = parts.next();
                let path = parts.next();
                match (fmt, path) {
                    (Some("json"), Some(path)) => match save_project_to_json(&project, path) {
                        Ok(_) => println!("Project saved to {}.", path),
                        Err(e) => println!("Error saving project: {}", e),
                    },
                    (Some("csv"), Some(path)) => match project.schedule() {
                        Ok(result) => match save_schedule_to_csv(&result, path) {
                            Ok(_) => println!("Schedule saved to {}.", path),
                            Err(e) => println!("Error saving schedule: {}", e),
                        },
                        Err(e) => println!("Schedule error: {}", e),
                    },
                    (Some("results"), Some(path)) => match &last_simulation {
                        Some(output) => match save_results_to_json(output, path) {
                            Ok(_) => println!("Simulation results saved to {}.", path),
                            Err(e) => println!("Error saving results: {}", e),
                        },
                        None => println!("No simulation results. Run 'simulate' first."),
                    },
                    _ => println!("Usage: save <json|csv|results> <path>"),
                }
            }
            "load" => {
                let loaded = match parts.next() {
                    Some("json") => match parts.next() {
                        Some(path) => load_project_from_json(path).map_err(|e| e.to_string()),
                        None => Err("Usage: load json <path>".to_string()),
                    },
                    Some("csv") => load_csv_project(&mut parts),
                    _ => Err("Usage: load <json|csv> <path...>".to_string()),
                };
                match loaded {
                    Ok(mut loaded) => {
                        apply_env(&mut loaded.config);
                        project = loaded;
                        last_leveling = None;
                        last_simulation = None;
                        println!(
                            "Project loaded with {} activities.",
                            project.activities.len()
                        );
                        print_schedule(&project);
                    }
                    Err(e) => println!("Error loading project: {}", e),
                }
            }
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }
}
