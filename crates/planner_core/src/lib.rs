//! Core domain logic for the planner.
//! This crate is the single source of truth for task invariants; GUI shells
//! call into the repository and view model exposed here.

pub mod calendar;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use calendar::window::{month_window, week_window, WEEK_LEN};
pub use config::{ConfigError, PlannerConfig};
pub use logging::{default_log_level, init_logging, parse_log_level, LogSettings, LoggingError};
pub use model::task::{
    parse_task_date, DayTask, NewTask, Task, TaskId, TaskPatch, TaskValidationError,
};
pub use repo::task_repo::{ErrorKind, RepoError, RepoResult, SqliteTaskRepository, TaskRepository};
pub use service::planner_service::{day_label, DayAgenda, MonthOverview, PlannerService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
