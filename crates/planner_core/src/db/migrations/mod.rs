//! Planner schema versions.
//!
//! The schema version lives in `PRAGMA user_version`; version `0` is an empty
//! file. Pending steps run in one transaction, so a store is either fully at
//! the old version or fully at the new one.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    name: "create_tasks",
    sql: include_str!("0001_init.sql"),
}];

/// Versions a store moved between while being opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
}

impl MigrationReport {
    /// Whether at least one schema step ran.
    pub fn upgraded(&self) -> bool {
        self.from_version < self.to_version
    }
}

/// Schema version this build reads and writes.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Reads the schema version recorded in the store.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Brings the store up to `latest_version()`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the store was written by a newer build.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<MigrationReport> {
    let from_version = schema_version(conn)?;
    let to_version = latest_version();
    if from_version > to_version {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: to_version,
        });
    }

    let report = MigrationReport {
        from_version,
        to_version,
    };
    if !report.upgraded() {
        return Ok(report);
    }

    let tx = conn.transaction()?;
    for step in SCHEMA_STEPS.iter().filter(|step| step.version > from_version) {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        from_version, to_version
    );
    Ok(report)
}
