// ============================================================================
// theoraq-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// This module implements the builder pattern for the CoreConfig structure,
// providing a fluent API for creating and configuring CoreConfig instances.
// Unset fields keep the defaults from CoreConfig::default().

use std::path::PathBuf;
use std::time::Duration;

use super::{CoreConfig, EncodeMode};
use crate::progress::ProgressFormat;

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use theoraq_core::config::CoreConfigBuilder;
/// use theoraq_core::progress::ProgressFormat;
///
/// let config = CoreConfigBuilder::new()
///     .progress_format(ProgressFormat::KeyValue)
///     .output_dir("/tmp/encoded")
///     .build();
/// assert_eq!(config.progress_format, ProgressFormat::KeyValue);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    /// Creates a new CoreConfigBuilder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the encoder binary.
    pub fn encoder_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.encoder_path = path.into();
        self
    }

    /// Sets the progress grammar. `ProgressFormat::Auto` probes the encoder.
    pub fn progress_format(mut self, format: ProgressFormat) -> Self {
        self.config.progress_format = format;
        self
    }

    pub fn mode(mut self, mode: EncodeMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Sets the number of encodes that may run at once.
    pub fn max_concurrent_jobs(mut self, jobs: usize) -> Self {
        self.config.max_concurrent_jobs = jobs;
        self
    }

    pub fn warning_hold(mut self, hold: Duration) -> Self {
        self.config.warning_hold = hold;
        self
    }

    /// Sets how long cancellation waits for a graceful exit.
    pub fn terminate_timeout(mut self, timeout: Duration) -> Self {
        self.config.terminate_timeout = timeout;
        self
    }

    pub fn kill_grace(mut self, grace: Duration) -> Self {
        self.config.kill_grace = grace;
        self
    }

    /// Sets the directory encoded files are written to.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    /// Builds the CoreConfig. Call `validate()` on the result before use.
    pub fn build(self) -> CoreConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_match_config_defaults() {
        let built = CoreConfigBuilder::new().build();
        let default = CoreConfig::default();
        assert_eq!(built.encoder_path, default.encoder_path);
        assert_eq!(built.max_concurrent_jobs, default.max_concurrent_jobs);
        assert_eq!(built.output_dir, None);
    }

    #[test]
    fn test_builder_overrides() {
        let config = CoreConfigBuilder::new()
            .encoder_path("/opt/f2t/ffmpeg2theora")
            .mode(EncodeMode::Immediate)
            .max_concurrent_jobs(3)
            .warning_hold(Duration::from_secs(1))
            .terminate_timeout(Duration::from_secs(1))
            .kill_grace(Duration::from_millis(100))
            .output_dir("/srv/ogv")
            .build();

        assert_eq!(config.encoder_path, PathBuf::from("/opt/f2t/ffmpeg2theora"));
        assert_eq!(config.mode, EncodeMode::Immediate);
        assert_eq!(config.max_concurrent_jobs, 3);
        assert_eq!(config.warning_hold, Duration::from_secs(1));
        assert_eq!(config.kill_grace, Duration::from_millis(100));
        assert_eq!(config.output_dir, Some(PathBuf::from("/srv/ogv")));
        assert!(config.validate().is_ok());
    }
}
