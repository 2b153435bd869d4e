// ============================================================================
// theoraq-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Console or File Logging for a CLI Run
//
// Without a log directory the CLI logs to stderr through env_logger, quiet by
// default so log lines do not tear through the progress rows. With a log
// directory every record goes to a timestamped file through the core's
// log4rs setup instead.
//
// USAGE:
// - RUST_LOG=info: job start/finish on the console
// - --verbose: debug level (commands, swallowed parse errors)
// - --log-dir DIR: DIR/theoraq_YYYYMMDD_HHMMSS.log

use std::path::{Path, PathBuf};

use log::LevelFilter;
use theoraq_core::CoreError;
use theoraq_core::file_logging::setup_file_logging;

use crate::error::CliResult;

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

fn level(verbose: bool) -> LevelFilter {
    if verbose { LevelFilter::Debug } else { LevelFilter::Info }
}

/// Console logging on stderr; `RUST_LOG` overrides the default filter.
pub fn init_console_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    // A second init (tests running main logic twice) keeps the first logger.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .try_init();
}

/// Starts file logging in `log_dir` and returns the log file path.
pub fn init_file_logging(log_dir: &Path, verbose: bool) -> CliResult<PathBuf> {
    let log_file = log_dir.join(format!("theoraq_{}.log", get_timestamp()));
    setup_file_logging(&log_file, level(verbose))
        .map_err(|e| CoreError::OperationFailed(format!("Failed to set up file logging: {e:#}")))?;
    Ok(log_file)
}
