// ============================================================================
// theoraq-core/src/encoder/process.rs
// ============================================================================
//
// ENCODER PROCESS: Spawning and Signalling the External Encoder
//
// This module provides abstractions for spawning the encoder and for
// signalling it from another thread while a worker is blocked reading its
// output. The worker owns the process; cancellation only ever holds a
// ProcessSignaller.
//
// KEY COMPONENTS:
// - EncoderProcess: Trait representing a running encoder
// - EncoderSpawner: Trait for creating new encoder processes
// - ProcessSignaller: Graceful terminate / forceful kill by pid
// - StdSpawner: Concrete implementation on std::process

use std::ffi::OsString;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;

use super::command::display_command;
use crate::error::{CoreError, CoreResult, command_start_error, command_wait_error};
use crate::progress::OutputStream;

// --- Encoder Execution Abstraction ---

/// Trait representing an active encoder process.
pub trait EncoderProcess: Send {
    /// Takes the captured progress stream. Returns `None` once taken.
    fn take_output(&mut self) -> Option<Box<dyn Read + Send>>;

    /// Handle that can signal this process from another thread.
    fn signaller(&self) -> Arc<dyn ProcessSignaller>;

    /// Waits for the process to exit and returns its exit code, if any.
    fn wait(&mut self) -> CoreResult<Option<i32>>;
}

/// Trait representing something that can spawn an encoder.
pub trait EncoderSpawner: Send + Sync {
    /// Spawns `argv[0]` with the remaining arguments, capturing `stream`.
    fn spawn(&self, argv: &[OsString], stream: OutputStream) -> CoreResult<Box<dyn EncoderProcess>>;
}

/// Sends termination signals to a running process.
pub trait ProcessSignaller: Send + Sync {
    /// Asks the process to exit (SIGTERM).
    fn terminate(&self) -> CoreResult<()>;

    /// Forces the process to exit (SIGKILL).
    fn kill(&self) -> CoreResult<()>;
}

// --- Concrete Implementation using std::process ---

/// Spawns the encoder as a plain child process.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdSpawner;

impl EncoderSpawner for StdSpawner {
    fn spawn(&self, argv: &[OsString], stream: OutputStream) -> CoreResult<Box<dyn EncoderProcess>> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| CoreError::Config("empty encoder command line".to_string()))?;
        let program_name = program.to_string_lossy().into_owned();

        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::null());
        match stream {
            OutputStream::Stdout => cmd.stdout(Stdio::piped()).stderr(Stdio::null()),
            OutputStream::Stderr => cmd.stdout(Stdio::null()).stderr(Stdio::piped()),
        };

        log::debug!("Spawning encoder: {}", display_command(argv));
        let mut child = cmd.spawn().map_err(|e| command_start_error(program_name.as_str(), e))?;

        let output: Option<Box<dyn Read + Send>> = match stream {
            OutputStream::Stdout => child.stdout.take().map(|s| Box::new(s) as Box<dyn Read + Send>),
            OutputStream::Stderr => child.stderr.take().map(|s| Box::new(s) as Box<dyn Read + Send>),
        };

        Ok(Box::new(StdProcess {
            signaller: Arc::new(PidSignaller::new(child.id())),
            program: program_name,
            output,
            child,
        }))
    }
}

/// Wrapper around `std::process::Child` implementing `EncoderProcess`.
pub struct StdProcess {
    child: Child,
    program: String,
    output: Option<Box<dyn Read + Send>>,
    signaller: Arc<PidSignaller>,
}

impl EncoderProcess for StdProcess {
    fn take_output(&mut self) -> Option<Box<dyn Read + Send>> {
        self.output.take()
    }

    fn signaller(&self) -> Arc<dyn ProcessSignaller> {
        self.signaller.clone()
    }

    fn wait(&mut self) -> CoreResult<Option<i32>> {
        let status = self
            .child
            .wait()
            .map_err(|e| command_wait_error(self.program.as_str(), e))?;
        log::debug!("{} exited with {}", self.program, status);
        Ok(status.code())
    }
}

/// Signals a process by pid, so the worker can keep exclusive ownership
/// of the `Child`.
///
/// Unix sends the signal in-process; Windows goes through `taskkill`.
#[derive(Debug, Clone, Copy)]
pub struct PidSignaller {
    pid: u32,
}

impl PidSignaller {
    pub fn new(pid: u32) -> Self {
        Self { pid }
    }

    #[cfg(unix)]
    fn send(&self, force: bool) -> CoreResult<()> {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        let pid = i32::try_from(self.pid)
            .map_err(|_| CoreError::OperationFailed(format!("pid {} out of range", self.pid)))?;
        let signal = if force { Signal::SIGKILL } else { Signal::SIGTERM };
        kill(Pid::from_raw(pid), signal).map_err(|errno| {
            CoreError::OperationFailed(format!("sending {signal} to pid {pid} failed: {errno}"))
        })
    }

    #[cfg(windows)]
    fn send(&self, force: bool) -> CoreResult<()> {
        let pid = self.pid.to_string();
        let mut cmd = Command::new("taskkill");
        if force {
            cmd.arg("/F");
        }
        let output = cmd
            .args(["/PID", pid.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| command_start_error("taskkill", e))?;
        if !output.status.success() {
            return Err(crate::error::command_failed_error(
                "taskkill",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }
}

impl ProcessSignaller for PidSignaller {
    fn terminate(&self) -> CoreResult<()> {
        self.send(false)
    }

    fn kill(&self) -> CoreResult<()> {
        self.send(true)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::io::Read;

    fn argv(parts: &[&str]) -> Vec<OsString> {
        parts.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_spawn_captures_requested_stream() {
        let mut process = StdSpawner
            .spawn(&argv(&["sh", "-c", "echo out; echo err >&2"]), OutputStream::Stderr)
            .unwrap();
        let mut text = String::new();
        process.take_output().unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text.trim(), "err");
        assert!(process.take_output().is_none());
        assert_eq!(process.wait().unwrap(), Some(0));
    }

    #[test]
    fn test_spawn_missing_binary() {
        let err = StdSpawner
            .spawn(&argv(&["/nonexistent/ffmpeg2theora"]), OutputStream::Stdout)
            .err()
            .unwrap();
        assert!(matches!(err, CoreError::DependencyNotFound(_)));
    }

    #[test]
    fn test_empty_command_line_is_rejected() {
        assert!(matches!(
            StdSpawner.spawn(&[], OutputStream::Stdout).err(),
            Some(CoreError::Config(_))
        ));
    }

    #[test]
    fn test_terminate_stops_process() {
        let mut process = StdSpawner
            .spawn(&argv(&["sleep", "30"]), OutputStream::Stdout)
            .unwrap();
        process.signaller().terminate().unwrap();
        // Killed by a signal: no exit code.
        assert_eq!(process.wait().unwrap(), None);
    }

    #[test]
    fn test_signalling_dead_process_fails_softly() {
        let mut process = StdSpawner.spawn(&argv(&["true"]), OutputStream::Stdout).unwrap();
        let signaller = process.signaller();
        process.wait().unwrap();
        assert!(signaller.kill().is_err());
    }
}
