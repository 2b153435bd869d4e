//! Configuration structures and constants for the theoraq-core library.
//!
//! This module provides the configuration for how jobs are run: which encoder
//! binary to use, which progress grammar to expect, how many encodes may run
//! at once and the timing of warnings and cancellation.

mod builder;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

pub use builder::CoreConfigBuilder;

use crate::encoder::DEFAULT_ENCODER;
use crate::error::{CoreError, CoreResult};
use crate::progress::ProgressFormat;

// Default constants

/// Default number of encodes allowed to run at the same time.
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 2;

/// How long an encoder warning stays visible before progress text resumes.
pub const DEFAULT_WARNING_HOLD: Duration = Duration::from_secs(3);

/// How long cancellation waits for the encoder to exit after the graceful signal.
pub const DEFAULT_TERMINATE_TIMEOUT: Duration = Duration::from_millis(2500);

/// How long cancellation waits after the forced kill before giving up.
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_millis(500);

/// When queued jobs start encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodeMode {
    /// Jobs wait until `encode_all`, which runs them one at a time in queue order.
    #[default]
    Batch,
    /// Every added job is handed to the worker pool at once.
    Immediate,
}

impl fmt::Display for EncodeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Batch => "batch",
            Self::Immediate => "immediate",
        })
    }
}

impl FromStr for EncodeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batch" => Ok(Self::Batch),
            "immediate" => Ok(Self::Immediate),
            other => Err(format!("unknown encode mode '{other}'")),
        }
    }
}

/// Main configuration structure for the theoraq-core library.
///
/// All fields have sensible defaults. The builder pattern provides a
/// convenient way to create and configure instances.
///
/// # Examples
///
/// ```rust
/// use theoraq_core::config::{CoreConfigBuilder, EncodeMode};
///
/// let config = CoreConfigBuilder::new()
///     .encoder_path("/usr/local/bin/ffmpeg2theora")
///     .mode(EncodeMode::Immediate)
///     .max_concurrent_jobs(4)
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct CoreConfig {
    /// Encoder binary, either a path or a name looked up on `PATH`
    pub encoder_path: PathBuf,

    /// Progress grammar; `Auto` probes the encoder
    pub progress_format: ProgressFormat,

    pub mode: EncodeMode,

    /// Size of the worker pool
    pub max_concurrent_jobs: usize,

    pub warning_hold: Duration,

    pub terminate_timeout: Duration,

    pub kill_grace: Duration,

    /// Directory for encoded files; `None` lets the encoder write next to the input
    pub output_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            encoder_path: PathBuf::from(DEFAULT_ENCODER),
            progress_format: ProgressFormat::Auto,
            mode: EncodeMode::default(),
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            warning_hold: DEFAULT_WARNING_HOLD,
            terminate_timeout: DEFAULT_TERMINATE_TIMEOUT,
            kill_grace: DEFAULT_KILL_GRACE,
            output_dir: None,
        }
    }
}

impl CoreConfig {
    /// Creates a configuration for the given encoder with default settings.
    pub fn new(encoder_path: PathBuf) -> Self {
        Self {
            encoder_path,
            ..Self::default()
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// * `CoreError::Config` - the encoder path is empty, the pool has no
    ///   workers, or the terminate timeout is zero
    pub fn validate(&self) -> CoreResult<()> {
        if self.encoder_path.as_os_str().is_empty() {
            return Err(CoreError::Config("encoder path must not be empty".to_string()));
        }
        if self.max_concurrent_jobs == 0 {
            return Err(CoreError::Config(
                "max_concurrent_jobs must be at least 1".to_string(),
            ));
        }
        if self.terminate_timeout.is_zero() {
            return Err(CoreError::Config(
                "terminate_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.encoder_path, PathBuf::from("ffmpeg2theora"));
        assert_eq!(config.mode, EncodeMode::Batch);
        assert_eq!(config.warning_hold, Duration::from_secs(3));
        assert_eq!(config.terminate_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = CoreConfig::new(PathBuf::new());
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));

        config.encoder_path = PathBuf::from("ffmpeg2theora");
        config.max_concurrent_jobs = 0;
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));

        config.max_concurrent_jobs = 1;
        config.terminate_timeout = Duration::ZERO;
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Immediate".parse::<EncodeMode>(), Ok(EncodeMode::Immediate));
        assert_eq!("batch".parse::<EncodeMode>(), Ok(EncodeMode::Batch));
        assert!("parallel".parse::<EncodeMode>().is_err());
    }
}
