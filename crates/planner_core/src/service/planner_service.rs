//! Date-scoped planner view model.
//!
//! # Responsibility
//! - Decide which tasks the week and month views show.
//! - Offer one facade for task mutations triggered by the presentation layer.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic and holds no cached task state.
//! - Parent completion never derives from subtask completion.

use crate::calendar::window::{month_window, week_window, WEEK_LEN};
use crate::model::task::{DayTask, NewTask, Task, TaskId, TaskPatch};
use crate::repo::task_repo::{RepoError, RepoResult, TaskRepository};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

/// Header format used for day panels, e.g. `Tue Jan 30`.
pub const DAY_LABEL_FORMAT: &str = "%a %b %d";

/// One day panel of the week view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayAgenda {
    pub date: NaiveDate,
    /// Display header for the day panel.
    pub label: String,
    pub tasks: Vec<DayTask>,
}

/// Everything the month calendar needs for one year/month pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthOverview {
    pub year: i32,
    pub month: u32,
    /// Every day of the month, ascending.
    pub days: Vec<NaiveDate>,
    /// Days to highlight because they have at least one task.
    pub days_with_tasks: BTreeSet<NaiveDate>,
}

/// Planner facade over a task repository implementation.
pub struct PlannerService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> PlannerService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the rolling 7-day window starting at `today`.
    pub fn week_window(&self, today: NaiveDate) -> RepoResult<[NaiveDate; WEEK_LEN]> {
        week_window(today).map_err(RepoError::from)
    }

    /// Returns every day of one month.
    pub fn month_window(&self, year: i32, month: u32) -> RepoResult<Vec<NaiveDate>> {
        month_window(year, month).map_err(RepoError::from)
    }

    /// Tasks visible on one day; delegates to `list_for_date`.
    pub fn tasks_for_day(&self, date: NaiveDate) -> RepoResult<Vec<DayTask>> {
        self.repo.list_for_date(date)
    }

    /// Builds all seven day panels of the week view.
    pub fn week_agenda(&self, today: NaiveDate) -> RepoResult<Vec<DayAgenda>> {
        week_window(today)?
            .into_iter()
            .map(|date| -> RepoResult<DayAgenda> {
                Ok(DayAgenda {
                    date,
                    label: day_label(date),
                    tasks: self.repo.list_for_date(date)?,
                })
            })
            .collect()
    }

    /// Builds the month calendar model with highlighted days.
    pub fn month_overview(&self, year: i32, month: u32) -> RepoResult<MonthOverview> {
        let days = month_window(year, month)?;
        let days_with_tasks = self.repo.list_dates_with_tasks(month, year)?;
        Ok(MonthOverview {
            year,
            month,
            days,
            days_with_tasks,
        })
    }

    pub fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        self.repo.get_task(id)
    }

    /// Creates one top-level task.
    pub fn add_task(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
        date: NaiveDate,
    ) -> RepoResult<Task> {
        self.repo
            .create_task(&NewTask::new(title, date).with_description(description))
    }

    /// Creates one subtask; `date = None` schedules it on the parent's day.
    ///
    /// # Errors
    /// - `ParentNotFound` when the parent is missing or is itself a subtask.
    pub fn add_subtask(
        &self,
        parent_id: TaskId,
        title: impl Into<String>,
        date: Option<NaiveDate>,
    ) -> RepoResult<Task> {
        let date = match date {
            Some(date) => date,
            None => {
                self.repo
                    .get_task(parent_id)?
                    .ok_or(RepoError::ParentNotFound(parent_id))?
                    .date
            }
        };
        self.repo
            .create_task(&NewTask::subtask(parent_id, title, date))
    }

    /// Applies a partial edit; only provided fields change.
    pub fn edit_task(&self, id: TaskId, patch: &TaskPatch) -> RepoResult<Task> {
        self.repo.update_task(id, patch)
    }

    /// Sets the completion checkbox of one task.
    pub fn set_completed(&self, id: TaskId, value: bool) -> RepoResult<Task> {
        self.repo.set_completed(id, value)
    }

    /// Deletes one task with its subtasks; returns rows removed.
    pub fn delete_task(&self, id: TaskId) -> RepoResult<usize> {
        self.repo.delete_task(id)
    }

    pub fn subtasks_of(&self, parent_id: TaskId) -> RepoResult<Vec<Task>> {
        self.repo.list_subtasks(parent_id)
    }
}

/// Formats the day panel header, e.g. `Tue Jan 30`.
pub fn day_label(date: NaiveDate) -> String {
    date.format(DAY_LABEL_FORMAT).to_string()
}
