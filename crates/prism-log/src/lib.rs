//! Structured logging and tracing for Prism runs.
//!
//! Console output with timestamps and module paths, plus optional JSON file
//! logging into the run's log directory for post-mortem analysis. Records sent
//! through the `log` facade (as the config crate does) are captured too.

use std::fs::File;
use std::path::{Path, PathBuf};

use prism_config::LoggingConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor an explicit level is given.
pub const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log file written into the log directory.
pub const LOG_FILE_NAME: &str = "prism.log";

/// Initialize the tracing subscriber for a run.
///
/// Sets up structured logging with:
/// - Console output with timestamps, module paths, and severity levels
/// - JSON file logging into `logging.log_dir` when `file_output` is set
/// - Environment-based filtering (respects RUST_LOG)
/// - An explicit `level` (e.g. from `--log-level`) when RUST_LOG is unset
///
/// A log directory that cannot be created is skipped; console logging still
/// starts.
///
/// # Examples
///
/// ```no_run
/// use prism_config::{CliArgs, RunConfig};
/// use prism_log::init_logging;
///
/// let args = CliArgs {
///     log_level: Some("debug".to_string()),
///     ..CliArgs::default()
/// };
/// let run = RunConfig::default();
/// init_logging(Some(&run.logging), true, args.log_level.as_deref());
/// ```
pub fn init_logging(logging: Option<&LoggingConfig>, file_output: bool, level: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_string(level)));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if let Some(dir) = logging.filter(|_| file_output).and_then(log_dir)
        && let Ok(log_file) = create_log_file(&dir)
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        tracing::info!(log_dir = %dir.display(), "Logging initialized with JSON file output");
        return;
    }

    subscriber.init();
    tracing::debug!("Logging initialized");
}

/// Create an `EnvFilter` with the default filter string.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

/// Filter directive for an optional level override.
fn filter_string(level: Option<&str>) -> String {
    match level.map(str::trim) {
        Some(level) if !level.is_empty() => level.to_string(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// The logging section's log directory, if it still holds a path.
pub fn log_dir(logging: &LoggingConfig) -> Option<PathBuf> {
    logging.log_dir.get().cloned()
}

fn create_log_file(dir: &Path) -> std::io::Result<File> {
    std::fs::create_dir_all(dir)?;
    File::create(dir.join(LOG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_config::{CliArgs, ConfigNode, Mapping, Value};

    #[test]
    fn test_default_log_level() {
        let filter = default_env_filter();
        assert!(format!("{}", filter).contains("info"));
    }

    #[test]
    fn test_explicit_level_overrides_default() {
        assert_eq!(filter_string(Some("debug,prism_config=trace")), "debug,prism_config=trace");
        assert_eq!(filter_string(Some("  ")), DEFAULT_FILTER);
        assert_eq!(filter_string(None), DEFAULT_FILTER);
    }

    #[test]
    fn test_cli_log_level_becomes_filter() {
        let args = CliArgs {
            log_level: Some("warn,prism_config=debug".to_string()),
            ..CliArgs::default()
        };
        assert_eq!(filter_string(args.log_level.as_deref()), "warn,prism_config=debug");
        assert_eq!(filter_string(CliArgs::default().log_level.as_deref()), DEFAULT_FILTER);
    }

    #[test]
    fn test_env_filter_parsing() {
        let valid_filters = ["info", "debug,prism_config=trace", "warn,prism_log=debug", "error"];

        for filter_str in &valid_filters {
            let result = EnvFilter::try_from(*filter_str);
            assert!(result.is_ok(), "Failed to parse filter: {}", filter_str);
        }
    }

    #[test]
    fn test_log_dir_from_config() {
        let logging = LoggingConfig::default();
        assert_eq!(log_dir(&logging), Some(PathBuf::from("logs")));

        let mut logging = LoggingConfig::default();
        let mut patch = Mapping::new();
        patch.insert("log_dir".to_string(), Value::from(false));
        logging.overlay(&patch);
        assert_eq!(log_dir(&logging), None);
    }

    #[test]
    fn test_file_logger_creation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("nested").join("logs");

        create_log_file(&log_path).unwrap();
        assert!(log_path.join(LOG_FILE_NAME).is_file());
    }
}
