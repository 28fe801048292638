//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/read/update/delete/complete APIs over the `tasks` table.
//! - Group subtasks under their parent for date-scoped reads.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Subtask parents must be existing top-level tasks.
//! - Cascading deletes run in one immediate transaction.
//! - Listing order is `created_at ASC, id ASC` for parents and subtasks.
//! - Every task is listed on its own date; a subtask dated away from its
//!   parent is listed under a context copy of that parent.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::calendar::window::month_bounds;
use crate::db::{latest_version, schema_version, DbError};
use crate::model::task::{
    ensure_storable_date, format_task_date, normalize_description, normalize_title, DayTask,
    NewTask, Task, TaskId, TaskPatch, TaskValidationError, TASK_DATE_FORMAT,
};
use chrono::NaiveDate;
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    date,
    completed,
    parent_id,
    created_at,
    updated_at
FROM tasks";

const NOW_MS_SQL: &str = "CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)";

const REQUIRED_COLUMNS: [&str; 8] = [
    "id",
    "title",
    "description",
    "date",
    "completed",
    "parent_id",
    "created_at",
    "updated_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Coarse error category surfaced to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; the user can correct it.
    Validation,
    /// A referenced task id does not exist.
    NotFound,
    /// The store is unavailable, corrupt, or not migrated.
    Storage,
}

/// Repository error for task persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    /// Target task does not exist.
    NotFound(TaskId),
    /// Requested parent is missing or is itself a subtask.
    ParentNotFound(TaskId),
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) | Self::ParentNotFound(_) => ErrorKind::NotFound,
            Self::Db(_) | Self::UninitializedConnection { .. } | Self::InvalidData(_) => {
                ErrorKind::Storage
            }
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent task not found: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "task repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::ParentNotFound(_)
            | Self::UninitializedConnection { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for task CRUD and date-scoped reads.
pub trait TaskRepository {
    /// Inserts one task or subtask and returns the stored row.
    fn create_task(&self, input: &NewTask) -> RepoResult<Task>;
    /// Loads one task by id.
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Applies the provided patch fields and returns the stored row.
    fn update_task(&self, id: TaskId, patch: &TaskPatch) -> RepoResult<Task>;
    /// Deletes one task and its subtasks, returning the number of rows removed.
    fn delete_task(&self, id: TaskId) -> RepoResult<usize>;
    /// Sets the completion flag of one task.
    fn set_completed(&self, id: TaskId, value: bool) -> RepoResult<Task>;
    /// Lists the tasks of one day, each top-level task carrying that day's
    /// subtasks. Parents dated elsewhere appear when they own such a subtask.
    fn list_for_date(&self, date: NaiveDate) -> RepoResult<Vec<DayTask>>;
    /// Lists every subtask of one parent regardless of date.
    fn list_subtasks(&self, parent_id: TaskId) -> RepoResult<Vec<Task>>;
    /// Returns the days of one month that have at least one task or subtask.
    fn list_dates_with_tasks(&self, month: u32, year: i32) -> RepoResult<BTreeSet<NaiveDate>>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_task_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, input: &NewTask) -> RepoResult<Task> {
        let title = normalize_title(&input.title)?;
        let description = normalize_description(&input.description);
        let date = ensure_storable_date(input.date)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if let Some(parent_id) = input.parent_id {
            ensure_top_level_parent(&tx, parent_id)?;
        }

        tx.execute(
            "INSERT INTO tasks (
                title,
                description,
                date,
                completed,
                parent_id
            ) VALUES (?1, ?2, ?3, 0, ?4);",
            params![
                title,
                description,
                format_task_date(date),
                input.parent_id,
            ],
        )?;
        let id = tx.last_insert_rowid();
        let task = load_required_task(&tx, id)?;
        tx.commit()?;

        debug!(
            "event=task_create module=repo status=ok task_id={} parent_id={}",
            task.id,
            task.parent_id.map_or_else(|| "none".to_string(), |p| p.to_string())
        );
        Ok(task)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        load_task(self.conn, id)
    }

    fn update_task(&self, id: TaskId, patch: &TaskPatch) -> RepoResult<Task> {
        if patch.is_empty() {
            return load_required_task(self.conn, id);
        }

        let mut assignments: Vec<&'static str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(title) = patch.title.as_deref() {
            assignments.push("title = ?");
            bind_values.push(Value::Text(normalize_title(title)?));
        }
        if let Some(description) = patch.description.as_deref() {
            assignments.push("description = ?");
            bind_values.push(Value::Text(normalize_description(description)));
        }
        if let Some(date) = patch.date {
            assignments.push("date = ?");
            bind_values.push(Value::Text(format_task_date(ensure_storable_date(date)?)));
        }
        if let Some(completed) = patch.completed {
            assignments.push("completed = ?");
            bind_values.push(Value::Integer(bool_to_int(completed)));
        }

        let sql = format!(
            "UPDATE tasks SET {}, updated_at = {NOW_MS_SQL} WHERE id = ?;",
            assignments.join(", ")
        );
        bind_values.push(Value::Integer(id));

        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        load_required_task(self.conn, id)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if load_task(&tx, id)?.is_none() {
            return Err(RepoError::NotFound(id));
        }

        let subtasks_removed = tx.execute("DELETE FROM tasks WHERE parent_id = ?1;", [id])?;
        let removed = tx.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        tx.commit()?;

        let total = subtasks_removed + removed;
        info!(
            "event=task_delete module=repo status=ok task_id={} rows_removed={}",
            id, total
        );
        Ok(total)
    }

    fn set_completed(&self, id: TaskId, value: bool) -> RepoResult<Task> {
        let changed = self.conn.execute(
            &format!("UPDATE tasks SET completed = ?2, updated_at = {NOW_MS_SQL} WHERE id = ?1;"),
            params![id, bool_to_int(value)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        load_required_task(self.conn, id)
    }

    fn list_for_date(&self, date: NaiveDate) -> RepoResult<Vec<DayTask>> {
        let day = format_task_date(date);
        // Parents dated elsewhere are pulled in when they own a subtask on `day`.
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE date = ?1
                OR id IN (
                    SELECT parent_id
                    FROM tasks
                    WHERE date = ?1
                      AND parent_id IS NOT NULL
                )
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([day])?;

        let mut parents = Vec::new();
        let mut subtasks_by_parent: HashMap<TaskId, Vec<Task>> = HashMap::new();
        while let Some(row) = rows.next()? {
            let task = parse_task_row(row)?;
            match task.parent_id {
                None => parents.push(task),
                Some(parent_id) => subtasks_by_parent.entry(parent_id).or_default().push(task),
            }
        }

        let entries: Vec<DayTask> = parents
            .into_iter()
            .map(|task| {
                let subtasks = subtasks_by_parent.remove(&task.id).unwrap_or_default();
                DayTask {
                    scheduled_here: task.date == date,
                    task,
                    subtasks,
                }
            })
            .collect();

        if let Some(orphan_parent) = subtasks_by_parent.keys().next() {
            return Err(RepoError::InvalidData(format!(
                "subtask parent {orphan_parent} is not a top-level task"
            )));
        }
        Ok(entries)
    }

    fn list_subtasks(&self, parent_id: TaskId) -> RepoResult<Vec<Task>> {
        if load_task(self.conn, parent_id)?.is_none() {
            return Err(RepoError::NotFound(parent_id));
        }

        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE parent_id = ?1
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([parent_id])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn list_dates_with_tasks(&self, month: u32, year: i32) -> RepoResult<BTreeSet<NaiveDate>> {
        let (first, last) = month_bounds(year, month)?;

        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT date
             FROM tasks
             WHERE date BETWEEN ?1 AND ?2;",
        )?;
        let mut rows = stmt.query([format_task_date(first), format_task_date(last)])?;
        let mut dates = BTreeSet::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            dates.insert(parse_date(&value)?);
        }
        Ok(dates)
    }
}

fn load_task(conn: &Connection, id: TaskId) -> RepoResult<Option<Task>> {
    let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_task_row(row)?));
    }
    Ok(None)
}

fn load_required_task(conn: &Connection, id: TaskId) -> RepoResult<Task> {
    load_task(conn, id)?.ok_or(RepoError::NotFound(id))
}

fn ensure_top_level_parent(conn: &Connection, parent_id: TaskId) -> RepoResult<()> {
    let grandparent: Option<Option<TaskId>> = conn
        .query_row(
            "SELECT parent_id FROM tasks WHERE id = ?1;",
            [parent_id],
            |row| row.get(0),
        )
        .optional()?;

    match grandparent {
        Some(None) => Ok(()),
        // Missing rows and subtasks are both rejected: nesting stops at one level.
        Some(Some(_)) | None => Err(RepoError::ParentNotFound(parent_id)),
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let date_text: String = row.get("date")?;
    let date = parse_date(&date_text)?;

    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid completed value `{other}` in tasks.completed"
            )));
        }
    };

    let title: String = row.get("title")?;
    if title.trim().is_empty() {
        return Err(RepoError::InvalidData(
            "empty title in tasks.title".to_string(),
        ));
    }

    Ok(Task {
        id: row.get("id")?,
        title,
        description: row.get("description")?,
        date,
        completed,
        parent_id: row.get("parent_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_date(value: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, TASK_DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in tasks.date")))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_task_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let mut stmt = conn.prepare("PRAGMA table_info(tasks);")?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        let column: String = row.get(1)?;
        columns.push(column);
    }

    if columns.is_empty() {
        return Err(RepoError::InvalidData("missing table `tasks`".to_string()));
    }
    for column in REQUIRED_COLUMNS {
        if !columns.iter().any(|current| current == column) {
            return Err(RepoError::InvalidData(format!(
                "missing column `{column}` in table `tasks`"
            )));
        }
    }

    Ok(())
}
