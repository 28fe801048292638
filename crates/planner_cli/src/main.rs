//! Planner process entry point.
//!
//! # Responsibility
//! - Compose config, logging, store and view model once per process.
//! - Print the current week agenda and this month's highlighted days.

use chrono::Local;
use log::error;
use planner_core::calendar::window::month_of;
use planner_core::db::open_db;
use planner_core::{
    core_version, init_logging, DayTask, PlannerConfig, PlannerService, SqliteTaskRepository,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=app_exit module=cli status=error error={message}");
            eprintln!("planner: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config = PlannerConfig::resolve().map_err(|err| err.to_string())?;
    config.ensure_dirs().map_err(|err| err.to_string())?;
    init_logging(&config.log_settings()).map_err(|err| err.to_string())?;

    // The connection lives until `run` returns.
    let conn = open_db(&config.db_path).map_err(|err| format!("open store failed: {err}"))?;
    let repo = SqliteTaskRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let service = PlannerService::new(repo);

    let today = Local::now().date_naive();
    println!("planner {} ({})", core_version(), config.db_path.display());

    for day in service.week_agenda(today).map_err(|err| err.to_string())? {
        println!("{}", day.label);
        for entry in &day.tasks {
            println!("  {}", parent_line(entry));
            for subtask in &entry.subtasks {
                println!("    {}", checkbox_line(subtask));
            }
        }
    }

    let (year, month) = month_of(today);
    let overview = service
        .month_overview(year, month)
        .map_err(|err| err.to_string())?;
    let marked = overview
        .days_with_tasks
        .iter()
        .map(|date| date.format("%d").to_string())
        .collect::<Vec<_>>();
    println!(
        "{year}-{month:02}: {} of {} days have tasks [{}]",
        marked.len(),
        overview.days.len(),
        marked.join(" ")
    );

    Ok(())
}

/// Parents listed only for their subtasks carry their own date.
fn parent_line(entry: &DayTask) -> String {
    if entry.scheduled_here {
        checkbox_line(&entry.task)
    } else {
        format!("{} (from {})", checkbox_line(&entry.task), entry.task.date)
    }
}

fn checkbox_line(task: &planner_core::Task) -> String {
    let mark = if task.completed { 'x' } else { ' ' };
    format!("[{mark}] #{} {}", task.id, task.title)
}
