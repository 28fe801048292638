//! Rolling file logs for the planner process.
//!
//! # Responsibility
//! - Start the `flexi_logger` backend once, from the composition root.
//! - Keep every log line in the `event=... module=... status=...` shape.
//!
//! # Invariants
//! - Log files only ever receive ids, dates and counts, never task text.
//! - A second start with equal settings is a no-op; different settings fail.

use flexi_logger::{
    Cleanup, Criterion, DeferredNow, Duplicate, FileSpec, FlexiLoggerError, LogSpecification,
    Logger, LoggerHandle, Naming, WriteMode,
};
use log::{info, LevelFilter, Record};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const LOG_FILE_BASENAME: &str = "planner";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const LINE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

static ACTIVE_LOGGER: OnceCell<ActiveLogger> = OnceCell::new();

struct ActiveLogger {
    settings: LogSettings,
    _handle: LoggerHandle,
}

/// Where and how verbosely the process logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LevelFilter,
    /// Must be absolute; created on start when missing.
    pub log_dir: PathBuf,
}

impl LogSettings {
    pub fn new(level: LevelFilter, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            level,
            log_dir: log_dir.into(),
        }
    }
}

#[derive(Debug)]
pub enum LoggingError {
    /// Level text is not one of `off|error|warn|info|debug|trace`.
    InvalidLevel(String),
    RelativeDir(PathBuf),
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    /// Logging already runs with the contained settings.
    AlreadyInitialized(LogSettings),
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLevel(value) => write!(
                f,
                "unsupported log level `{value}`; expected off|error|warn|info|debug|trace"
            ),
            Self::RelativeDir(path) => {
                write!(f, "log directory must be absolute, got `{}`", path.display())
            }
            Self::CreateDir { path, source } => write!(
                f,
                "failed to create log directory `{}`: {source}",
                path.display()
            ),
            Self::Backend(err) => write!(f, "failed to start logger: {err}"),
            Self::AlreadyInitialized(active) => write!(
                f,
                "logging already runs at level {} in `{}`",
                active.level,
                active.log_dir.display()
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            Self::InvalidLevel(_) | Self::RelativeDir(_) | Self::AlreadyInitialized(_) => None,
        }
    }
}

impl From<FlexiLoggerError> for LoggingError {
    fn from(value: FlexiLoggerError) -> Self {
        Self::Backend(value)
    }
}

/// Starts rolling file logs; warnings and errors are echoed to stderr.
///
/// # Errors
/// - `RelativeDir` / `CreateDir` when the log directory is unusable.
/// - `AlreadyInitialized` when logging runs with other settings.
/// - `Backend` when `flexi_logger` cannot start.
pub fn init_logging(settings: &LogSettings) -> Result<(), LoggingError> {
    if !settings.log_dir.is_absolute() {
        return Err(LoggingError::RelativeDir(settings.log_dir.clone()));
    }

    let active = ACTIVE_LOGGER.get_or_try_init(|| start_logger(settings))?;
    if active.settings != *settings {
        return Err(LoggingError::AlreadyInitialized(active.settings.clone()));
    }
    Ok(())
}

fn start_logger(settings: &LogSettings) -> Result<ActiveLogger, LoggingError> {
    create_log_dir(&settings.log_dir)?;

    let spec = LogSpecification::builder()
        .default(settings.level)
        .build();
    let handle = Logger::with(spec)
        .log_to_file(
            FileSpec::default()
                .directory(settings.log_dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .duplicate_to_stderr(Duplicate::Warn)
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(planner_line_format)
        .start()?;

    info!(
        "event=logging_init module=core status=ok level={} log_dir={} version={}",
        settings.level,
        settings.log_dir.display(),
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        settings: settings.clone(),
        _handle: handle,
    })
}

fn create_log_dir(dir: &Path) -> Result<(), LoggingError> {
    std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Parses a level name, case-insensitively; `warning` is accepted for `warn`.
pub fn parse_log_level(raw: &str) -> Result<LevelFilter, LoggingError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("warning") {
        return Ok(LevelFilter::Warn);
    }
    LevelFilter::from_str(trimmed).map_err(|_| LoggingError::InvalidLevel(trimmed.to_string()))
}

/// One line per record: `<timestamp> <LEVEL> [<module path>] <message>`.
fn planner_line_format(
    w: &mut dyn Write,
    now: &mut DeferredNow,
    record: &Record,
) -> std::io::Result<()> {
    write!(
        w,
        "{} {:<5} [{}] {}",
        now.format(LINE_TIMESTAMP_FORMAT),
        record.level(),
        record.module_path().unwrap_or_else(|| record.target()),
        record.args()
    )
}
