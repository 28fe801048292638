//! Runtime configuration for the planner process.
//!
//! # Responsibility
//! - Resolve the per-user storage path and log settings.
//! - Prepare directories before the store and logger are opened.
//!
//! # Invariants
//! - Default database path is `<home>/.planner_app/planner.sqlite3`.
//! - `PLANNER_DB_PATH` overrides the database path only when non-blank.
//! - `PLANNER_LOG_LEVEL` overrides the log level; unknown names are errors.

use crate::logging::{default_log_level, parse_log_level, LogSettings, LoggingError};
use directories_next::BaseDirs;
use log::LevelFilter;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = ".planner_app";
pub const DB_FILE_NAME: &str = "planner.sqlite3";
pub const LOG_DIR_NAME: &str = "logs";
pub const DB_PATH_ENV: &str = "PLANNER_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "PLANNER_LOG_LEVEL";

#[derive(Debug)]
pub enum ConfigError {
    /// No home directory could be determined for the current user.
    HomeDirUnavailable,
    LogLevel(LoggingError),
    Io { path: PathBuf, source: std::io::Error },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HomeDirUnavailable => write!(f, "could not determine the user home directory"),
            Self::LogLevel(err) => write!(f, "invalid {LOG_LEVEL_ENV}: {err}"),
            Self::Io { path, source } => {
                write!(f, "failed to create directory `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::HomeDirUnavailable => None,
            Self::LogLevel(err) => Some(err),
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Resolved process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    pub db_path: PathBuf,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
    pub log_level: LevelFilter,
}

impl PlannerConfig {
    /// Resolves configuration from the user home directory and environment.
    pub fn resolve() -> Result<Self, ConfigError> {
        let base_dirs = BaseDirs::new().ok_or(ConfigError::HomeDirUnavailable)?;
        let db_override = std::env::var(DB_PATH_ENV).ok();
        let level_override = std::env::var(LOG_LEVEL_ENV).ok();
        Self::from_home(base_dirs.home_dir(), db_override.as_deref())
            .with_log_level(level_override.as_deref())
    }

    /// Builds configuration rooted at `home` with an optional database override.
    pub fn from_home(home: &Path, db_override: Option<&str>) -> Self {
        let app_dir = home.join(APP_DIR_NAME);
        let db_path = db_override
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| app_dir.join(DB_FILE_NAME));

        Self {
            db_path,
            log_dir: app_dir.join(LOG_DIR_NAME),
            log_level: default_log_level(),
        }
    }

    /// Applies a non-blank level name over the default level.
    pub fn with_log_level(mut self, raw: Option<&str>) -> Result<Self, ConfigError> {
        if let Some(raw) = raw.filter(|value| !value.trim().is_empty()) {
            self.log_level = parse_log_level(raw).map_err(ConfigError::LogLevel)?;
        }
        Ok(self)
    }

    pub fn log_settings(&self) -> LogSettings {
        LogSettings::new(self.log_level, self.log_dir.clone())
    }

    /// Creates the database parent directory and the log directory.
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        let db_dir = self.db_path.parent().filter(|dir| !dir.as_os_str().is_empty());
        for dir in db_dir.into_iter().chain(std::iter::once(self.log_dir.as_path())) {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }
}
