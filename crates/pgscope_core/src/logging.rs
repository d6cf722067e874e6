//! Structured logging setup with console and file output.
//!
//! Logs go to a daily rotating file plus stdout, or to stdout alone when
//! attached to a terminal or when the log directory is unusable. The filter
//! comes from `PGSCOPE_LOG`, then `RUST_LOG`, then a build-dependent default.
//! Executed SQL is logged at debug level under the `pgscope::sql` target.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Logging configuration.
pub struct LogConfig {
    /// Directory for log files
    pub log_dir: PathBuf,
    /// Whether stdout is a terminal
    pub is_pty: bool,
    /// Optional custom log filter
    pub log_filter: Option<String>,
}

impl LogConfig {
    pub fn new(log_dir: PathBuf) -> Self {
        Self { log_dir, is_pty: atty::is(atty::Stream::Stdout), log_filter: None }
    }

    /// Set custom log filter.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }
}

/// Guard that must be held for the lifetime of the application.
///
/// Dropping this guard flushes pending log entries.
pub struct LoggingGuard {
    _worker_guard: Option<WorkerGuard>,
}

/// Install the global subscriber. Falls back to stdout-only output when
/// the file appender cannot be created.
pub fn init_logging(config: LogConfig) -> LoggingGuard {
    if config.is_pty {
        return init_stdout_logging(config.log_filter.as_deref());
    }

    match init_file_logging(&config) {
        Ok(guard) => LoggingGuard { _worker_guard: Some(guard) },
        Err(e) => {
            eprintln!("Warning: Failed to initialize file logging: {}. Using console only.", e);
            init_stdout_logging(config.log_filter.as_deref())
        }
    }
}

/// Initialize with the default log directory.
pub fn init_logging_default() -> LoggingGuard {
    init_logging(LogConfig::new(log_dir()))
}

fn init_stdout_logging(filter: Option<&str>) -> LoggingGuard {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(filter))
        .with_ansi(true)
        .with_target(false)
        .with_thread_ids(false)
        .try_init();

    LoggingGuard { _worker_guard: None }
}

fn init_file_logging(
    config: &LogConfig,
) -> Result<WorkerGuard, Box<dyn std::error::Error + Send + Sync>> {
    std::fs::create_dir_all(&config.log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("pgscope")
        .filename_suffix("log")
        .build(&config.log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let stdout = std::io::stdout.with_max_level(tracing::Level::INFO);
    let combined = stdout.and(non_blocking);

    tracing_subscriber::fmt()
        .with_writer(combined)
        .with_env_filter(build_env_filter(config.log_filter.as_deref()))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .try_init()?;

    Ok(guard)
}

/// Priority: custom filter > PGSCOPE_LOG > RUST_LOG > default.
fn build_env_filter(custom_filter: Option<&str>) -> EnvFilter {
    if let Some(filter) = custom_filter {
        return EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(default_log_filter()));
    }

    EnvFilter::try_from_env("PGSCOPE_LOG")
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter()))
}

/// Default log filter for the build type.
pub fn default_log_filter() -> &'static str {
    #[cfg(debug_assertions)]
    {
        "info,pgscope_core=debug,pgscope::sql=debug,tokio_postgres=warn"
    }
    #[cfg(not(debug_assertions))]
    {
        "warn,pgscope_core=info,pgscope::sql=info,tokio_postgres=warn"
    }
}

/// Default log directory under the platform's local data directory.
pub fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("pgscope")
        .join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(default_log_filter()).is_ok());
        assert!(default_log_filter().contains("pgscope::sql"));
    }

    #[test]
    fn test_invalid_custom_filter_falls_back() {
        let filter = build_env_filter(Some("pgscope_core=notalevel"));
        assert_eq!(filter.to_string(), EnvFilter::new(default_log_filter()).to_string());
    }

    #[test]
    fn test_log_dir_layout() {
        let dir = log_dir();
        assert!(dir.ends_with("pgscope/logs"));
    }

    #[test]
    fn test_file_logging_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let config = LogConfig {
            log_dir: tmp.path().join("logs"),
            is_pty: false,
            log_filter: Some("info".into()),
        };
        let _guard = init_logging(config);
        assert!(tmp.path().join("logs").is_dir());
    }
}
