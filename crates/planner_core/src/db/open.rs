//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.
//! - The parent directory of a file database exists after a successful open.

use super::migrations::{apply_migrations, MigrationReport};
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens the planner database file and applies all pending migrations.
///
/// Creates the parent directory on first run.
///
/// # Side effects
/// - Performs connection bootstrap and migration checks.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");

    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        if let Err(err) = std::fs::create_dir_all(parent) {
            error!(
                "event=db_open module=db status=error mode=file duration_ms={} error_code=db_dir_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(DbError::StorageDir {
                path: parent.to_path_buf(),
                source: err,
            });
        }
    }

    let conn = match Connection::open(path) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=file duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    finish_open(conn, "file", started_at)
}

/// Opens an in-memory SQLite database and applies all pending migrations.
///
/// Used by tests and by callers that want a throwaway planner.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let conn = match Connection::open_in_memory() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=memory duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    finish_open(conn, "memory", started_at)
}

fn finish_open(
    mut conn: Connection,
    mode: &'static str,
    started_at: Instant,
) -> DbResult<Connection> {
    match bootstrap_connection(&mut conn) {
        Ok(report) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={} schema_version={} upgraded={}",
                mode,
                started_at.elapsed().as_millis(),
                report.to_version,
                report.upgraded()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn bootstrap_connection(conn: &mut Connection) -> DbResult<MigrationReport> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)
}
