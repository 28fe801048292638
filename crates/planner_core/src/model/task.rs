//! Task domain model.
//!
//! # Responsibility
//! - Define the task record shared by week and month projections.
//! - Provide write-side input types (`NewTask`, `TaskPatch`).
//! - Normalize and validate user-entered titles and dates.
//!
//! # Invariants
//! - `title` is never empty after normalization.
//! - `date` is a calendar day without time-of-day.
//! - `parent_id` is fixed at creation time.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned task identifier (`tasks.id`).
pub type TaskId = i64;

/// Text encoding of `Task::date` in storage and at the presentation boundary.
pub const TASK_DATE_FORMAT: &str = "%Y-%m-%d";

/// Years whose ISO text sorts chronologically (four digits, no sign).
pub const MIN_TASK_YEAR: i32 = 0;
pub const MAX_TASK_YEAR: i32 = 9999;

/// Upper bound on normalized title length, in characters.
pub const MAX_TITLE_CHARS: usize = 500;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Canonical task record as persisted in the `tasks` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// Free-form notes, empty when unset.
    pub description: String,
    /// Day the task is scheduled for. Subtasks carry their own date.
    pub date: NaiveDate,
    pub completed: bool,
    /// `None` for top-level tasks.
    pub parent_id: Option<TaskId>,
    /// Unix epoch milliseconds; primary display ordering key.
    pub created_at: i64,
    /// Unix epoch milliseconds of the last mutation.
    pub updated_at: i64,
}

impl Task {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_subtask(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// A top-level task together with its subtasks scheduled on one day.
///
/// When only subtasks are scheduled on the day, the parent is still carried
/// so they render under it; `scheduled_here` is then `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTask {
    pub task: Task,
    /// Ordered by `created_at ASC, id ASC`.
    pub subtasks: Vec<Task>,
    /// Whether `task` itself is dated on the listed day.
    pub scheduled_here: bool,
}

impl DayTask {
    /// Iterates the parent followed by its subtasks in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        std::iter::once(&self.task).chain(self.subtasks.iter())
    }

    /// Number of rows this entry displays.
    pub fn row_count(&self) -> usize {
        1 + self.subtasks.len()
    }
}

/// Input for creating one task or subtask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    /// Must reference an existing top-level task when set.
    pub parent_id: Option<TaskId>,
}

impl NewTask {
    /// Creates input for a top-level task with an empty description.
    pub fn new(title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            date,
            parent_id: None,
        }
    }

    /// Creates input for a subtask under `parent_id`.
    pub fn subtask(parent_id: TaskId, title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::new(title, date)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Partial update for an existing task. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.completed.is_none()
    }
}

/// Input rejected before reaching storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is empty after whitespace normalization.
    EmptyTitle,
    /// Title exceeds `MAX_TITLE_CHARS` after normalization.
    TitleTooLong { chars: usize },
    /// Date input is blank.
    MissingDate,
    /// Date input is not a valid `YYYY-MM-DD` calendar day.
    InvalidDate(String),
    /// Month is outside `1..=12`.
    InvalidMonth(u32),
    /// Year is outside `MIN_TASK_YEAR..=MAX_TASK_YEAR`.
    InvalidYear(i32),
    /// Date arithmetic left the supported calendar range.
    DateOutOfRange(NaiveDate),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title must not be empty"),
            Self::TitleTooLong { chars } => write!(
                f,
                "task title has {chars} characters; at most {MAX_TITLE_CHARS} are allowed"
            ),
            Self::MissingDate => write!(f, "task date is required"),
            Self::InvalidDate(value) => {
                write!(f, "invalid task date `{value}`; expected YYYY-MM-DD")
            }
            Self::InvalidMonth(month) => write!(f, "invalid month {month}; expected 1..=12"),
            Self::InvalidYear(year) => write!(
                f,
                "unsupported calendar year {year}; expected {MIN_TASK_YEAR}..={MAX_TASK_YEAR}"
            ),
            Self::DateOutOfRange(date) => write!(f, "date {date} is out of the supported range"),
        }
    }
}

impl Error for TaskValidationError {}

/// Trims a title and collapses internal whitespace runs to one space.
pub fn normalize_title(raw: &str) -> Result<String, TaskValidationError> {
    let normalized = WHITESPACE_RE.replace_all(raw.trim(), " ").into_owned();
    if normalized.is_empty() {
        return Err(TaskValidationError::EmptyTitle);
    }
    let chars = normalized.chars().count();
    if chars > MAX_TITLE_CHARS {
        return Err(TaskValidationError::TitleTooLong { chars });
    }
    Ok(normalized)
}

/// Rejects years whose stored text would not sort chronologically.
pub fn ensure_supported_year(year: i32) -> Result<(), TaskValidationError> {
    if (MIN_TASK_YEAR..=MAX_TASK_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(TaskValidationError::InvalidYear(year))
    }
}

/// Checks that `date` can be stored and compared as `YYYY-MM-DD` text.
pub fn ensure_storable_date(date: NaiveDate) -> Result<NaiveDate, TaskValidationError> {
    ensure_supported_year(date.year())?;
    Ok(date)
}

/// Descriptions keep their line structure; only outer whitespace is trimmed.
pub fn normalize_description(raw: &str) -> String {
    raw.trim().to_string()
}

/// Parses presentation-layer date text into a task date.
pub fn parse_task_date(raw: &str) -> Result<NaiveDate, TaskValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TaskValidationError::MissingDate);
    }
    let date = NaiveDate::parse_from_str(trimmed, TASK_DATE_FORMAT)
        .map_err(|_| TaskValidationError::InvalidDate(trimmed.to_string()))?;
    ensure_storable_date(date)
}

/// Formats a task date the way it is stored.
pub fn format_task_date(date: NaiveDate) -> String {
    date.format(TASK_DATE_FORMAT).to_string()
}
