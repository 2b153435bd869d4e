use std::path::Path;

use anyhow::{Context, Result};
use log::LevelFilter;
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Logger, Root},
    encode::pattern::PatternEncoder,
};

/// Line layout of the session log.
pub const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}";

/// Routes all log records at `log_level` and above to `log_file`.
///
/// Creates missing parent directories. Can only succeed once per process,
/// because the global logger cannot be replaced.
pub fn setup_file_logging(log_file: &Path, log_level: LevelFilter) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(log_file)
        .with_context(|| format!("opening log file {}", log_file.display()))?;

    // Raw encoder output is logged at trace and never reaches the file.
    let runner_level = log_level.min(LevelFilter::Debug);

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .logger(Logger::builder().build("theoraq_core::runner", runner_level))
        .build(Root::builder().appender("file").build(log_level))?;

    log4rs::init_config(config)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_receives_records() {
        let dir = tempfile::tempdir().unwrap();
        let log_file = dir.path().join("nested").join("session.log");

        setup_file_logging(&log_file, LevelFilter::Info).unwrap();
        log::info!("queued clip.avi");
        log::debug!("hidden detail");
        log::logger().flush();

        let contents = std::fs::read_to_string(&log_file).unwrap();
        assert!(contents.contains("[INFO]"), "{contents}");
        assert!(contents.contains("queued clip.avi"));
        assert!(!contents.contains("hidden detail"));

        // The global logger is already taken.
        assert!(setup_file_logging(&dir.path().join("second.log"), LevelFilter::Info).is_err());
    }
}
