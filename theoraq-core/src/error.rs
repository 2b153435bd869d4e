// ============================================================================
// theoraq-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Custom Error Types for theoraq-core
//
// This module defines the error type used throughout the core library and a
// handful of constructor helpers for the errors raised around external
// process handling.
//
// KEY COMPONENTS:
// - CoreError: Enum of every failure the library reports
// - CoreResult: Result alias used by all public functions
// - Helper functions for command start/wait/failure errors

use std::process::ExitStatus;
use thiserror::Error;

use crate::job::JobId;

/// Custom error types for theoraq-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to start command '{0}': {1}")]
    CommandStart(String, std::io::Error),

    #[error("Failed to wait for command '{0}': {1}")]
    CommandWait(String, std::io::Error),

    #[error("Command '{0}' failed with status {1}: {2}")]
    CommandFailed(String, ExitStatus, String),

    #[error("Required external command '{0}' was not found")]
    DependencyNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No job with id {0} in the queue")]
    JobNotFound(JobId),

    #[error("Malformed progress line: {0}")]
    ProgressParse(String),

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for theoraq-core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Builds the error for a command that could not be spawned.
///
/// A missing binary is reported as [`CoreError::DependencyNotFound`] so callers
/// can tell "not installed" apart from other start failures.
pub fn command_start_error(cmd: impl Into<String>, err: std::io::Error) -> CoreError {
    let cmd = cmd.into();
    if err.kind() == std::io::ErrorKind::NotFound {
        CoreError::DependencyNotFound(cmd)
    } else {
        CoreError::CommandStart(cmd, err)
    }
}

pub fn command_wait_error(cmd: impl Into<String>, err: std::io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}

pub fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed(cmd.into(), status, stderr.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_missing_binary_maps_to_dependency_not_found() {
        let err = command_start_error("ffmpeg2theora", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, CoreError::DependencyNotFound(ref name) if name == "ffmpeg2theora"));
    }

    #[test]
    fn test_other_start_failures_keep_source() {
        let err = command_start_error(
            "ffmpeg2theora",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, CoreError::CommandStart(_, _)));
        assert!(err.to_string().contains("ffmpeg2theora"));
    }
}
