pub mod activity;
pub mod calculations;
pub mod calendar;
pub mod config;
pub mod error;
pub mod graph;
pub mod leveling;
pub mod metadata;
pub mod persistence;
pub mod project;
pub mod report;
pub mod resource;
pub mod schedule;
pub mod simulation;
pub(crate) mod validation;

pub use activity::{Activity, ActivityId, Dependency, DependencyType};
pub use calendar::{CalendarError, WorkCalendar, WorkCalendarConfig};
pub use config::{ConfigError, EngineConfig};
pub use error::{ScheduleCalculationReason, ScheduleError};
pub use graph::ScheduleDag;
pub use leveling::{
    ActivityShift, LevelingAlgorithm, LevelingComparison, LevelingError, LevelingInput,
    LevelingOptions, LevelingResult, OverAllocation, PriorityWeights, compare_leveling,
    detect_over_allocations, level_resources, level_resources_with,
};
pub use metadata::ProjectMetadata;
pub use persistence::{
    PersistenceError, load_activities_from_csv, load_assignments_from_csv,
    load_dependencies_from_csv, load_project_from_json, load_resources_from_csv,
    save_project_to_json, save_results_to_json, save_schedule_to_csv, validate_project,
};
pub use project::Project;
pub use resource::{Resource, ResourceAssignment, ResourceCalendar};
pub use schedule::{
    ActivitySchedule, CriticalPathEngine, SchedulePasses, ScheduleResult, ScheduleSummary,
    calculate_schedule,
};
pub use simulation::{
    DistributionError, DistributionSpec, DurationDistribution, MonteCarloEngine, SimulationConfig,
    SimulationError, SimulationOutput, TornadoBar, tornado,
};
