// ============================================================================
// theoraq-core/src/runner.rs
// ============================================================================
//
// JOB RUNNER: Running One Encode and Translating Its Output
//
// The runner builds the encoder command line for a job, launches the encoder,
// reads its progress stream line by line and reports status text through a
// callback. Cancellation is cooperative: the queue marks the job's control as
// cancelled and signals the live process; the runner notices the stream
// ending and reports the terminal status.
//
// KEY COMPONENTS:
// - JobRunner: spawn + monitor for a single job
// - cancel_job: terminate, wait for the exit notification, escalate to kill
// - CancelTiming / CancelOutcome: cancellation handshake parameters and result

use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, info, trace, warn};
use serde::Serialize;

use crate::config::{CoreConfig, DEFAULT_KILL_GRACE, DEFAULT_TERMINATE_TIMEOUT};
use crate::encoder::{EncoderSpawner, StdSpawner, build_command_line, resolve_progress_format};
use crate::error::CoreResult;
use crate::job::{JobControl, JobOutcome, JobSpec, LiveProcess};
use crate::progress::{LineOutcome, LineParser, STATUS_ENCODING, StatusTracker};

/// Terminal status of a successful encode.
pub const STATUS_DONE: &str = "Encoding done.";

/// Terminal status when the encoder gave no reason for failing.
pub const STATUS_FAILED: &str = "Encoding failed.";

/// Terminal status of a cancelled job.
pub const STATUS_CANCELLED: &str = "Encoding cancelled.";

/// Timing of the cancellation handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelTiming {
    /// Wait after the graceful signal
    pub terminate_timeout: Duration,
    /// Wait after the forced kill
    pub kill_grace: Duration,
}

impl Default for CancelTiming {
    fn default() -> Self {
        Self {
            terminate_timeout: DEFAULT_TERMINATE_TIMEOUT,
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }
}

impl CancelTiming {
    pub fn from_config(config: &CoreConfig) -> Self {
        Self {
            terminate_timeout: config.terminate_timeout,
            kill_grace: config.kill_grace,
        }
    }
}

/// How a cancellation request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelOutcome {
    /// No process was running; the job will not start
    NotRunning,
    /// The process exited after the graceful signal (or had already exited)
    Terminated,
    /// The process only exited after the forced kill
    Killed,
    /// The process survived the forced kill and was left behind
    Abandoned,
}

/// Requests cancellation of a job and waits, bounded, for its process to die.
///
/// Marks the control cancelled first so a job that has not started yet never
/// spawns. Signal failures (for example a process that already exited) are
/// ignored.
pub fn cancel_job(control: &JobControl, timing: CancelTiming) -> CancelOutcome {
    control.mark_cancelled();

    let Some(exited) = control.exit_notifier() else {
        return CancelOutcome::NotRunning;
    };
    if wait_for_exit(&exited, Duration::ZERO) {
        return CancelOutcome::Terminated;
    }

    if let Some(Err(e)) = control.signal_live(false) {
        debug!("Terminate signal not delivered: {e}");
    }
    if wait_for_exit(&exited, timing.terminate_timeout) {
        return CancelOutcome::Terminated;
    }

    warn!(
        "Encoder still running {:?} after terminate, killing it",
        timing.terminate_timeout
    );
    if let Some(Err(e)) = control.signal_live(true) {
        debug!("Kill signal not delivered: {e}");
    }
    if wait_for_exit(&exited, timing.kill_grace) {
        CancelOutcome::Killed
    } else {
        warn!("Encoder survived kill, abandoning it");
        CancelOutcome::Abandoned
    }
}

/// True once the exit notification fired within `timeout`.
fn wait_for_exit(exited: &Receiver<()>, timeout: Duration) -> bool {
    !matches!(exited.recv_timeout(timeout), Err(RecvTimeoutError::Timeout))
}

/// Clears the live slot when the process has been reaped, then drops the
/// exit notifier, which wakes anyone waiting in `cancel_job`.
struct LiveGuard<'a> {
    control: &'a JobControl,
    _exit: Sender<()>,
}

impl Drop for LiveGuard<'_> {
    fn drop(&mut self) {
        self.control.clear();
    }
}

/// Forwards status text, skipping repeats of the previous progress text.
struct StatusReporter<F> {
    on_status: F,
    last: Option<String>,
}

impl<F: FnMut(&str)> StatusReporter<F> {
    fn progress(&mut self, text: &str) {
        if self.last.as_deref() == Some(text) {
            return;
        }
        (self.on_status)(text);
        self.last = Some(text.to_string());
    }

    /// Terminal status is always delivered, exactly once.
    fn finish(mut self, text: &str) {
        (self.on_status)(text);
    }
}

/// Runs encodes for jobs; shared by all workers.
pub struct JobRunner {
    encoder_path: PathBuf,
    spawner: Arc<dyn EncoderSpawner>,
    parser: Arc<dyn LineParser>,
    warning_hold: Duration,
    timing: CancelTiming,
}

impl JobRunner {
    pub fn new(config: &CoreConfig, spawner: Arc<dyn EncoderSpawner>, parser: Arc<dyn LineParser>) -> Self {
        Self {
            encoder_path: config.encoder_path.clone(),
            spawner,
            parser,
            warning_hold: config.warning_hold,
            timing: CancelTiming::from_config(config),
        }
    }

    /// Runner for the real encoder. Probes the encoder when the progress
    /// format is `Auto`.
    ///
    /// # Errors
    ///
    /// * `CoreError::Config` - the configuration is invalid
    /// * `CoreError::DependencyNotFound` - probing found no encoder binary
    pub fn from_config(config: &CoreConfig) -> CoreResult<Self> {
        config.validate()?;
        let format = resolve_progress_format(&config.encoder_path, config.progress_format)?;
        info!("Using {} progress format for {}", format, config.encoder_path.display());
        Ok(Self::new(config, Arc::new(StdSpawner), Arc::from(format.parser())))
    }

    pub fn encoder_path(&self) -> &Path {
        &self.encoder_path
    }

    pub fn parser_name(&self) -> &'static str {
        self.parser.name()
    }

    /// Cancels the job's live process, see [`cancel_job`].
    pub fn cancel(&self, control: &JobControl) -> CancelOutcome {
        cancel_job(control, self.timing)
    }

    /// Runs one encode to completion and reports status text.
    ///
    /// `on_status` sees progress text in stream order, each distinct text
    /// once in a row, followed by exactly one terminal status.
    pub fn run<F>(&self, job: &JobSpec, control: &JobControl, on_status: F) -> JobOutcome
    where
        F: FnMut(&str),
    {
        let mut reporter = StatusReporter { on_status, last: None };

        if control.is_cancelled() {
            debug!("Job {} cancelled before start", job.id);
            reporter.finish(STATUS_CANCELLED);
            return JobOutcome::Cancelled;
        }

        let argv = build_command_line(&self.encoder_path, job);
        let mut process = match self.spawner.spawn(&argv, self.parser.stream()) {
            Ok(process) => process,
            Err(e) => {
                warn!("Job {}: could not start encoder: {e}", job.id);
                reporter.finish(&format!("Failed to start encoder: {e}"));
                return JobOutcome::Failed;
            }
        };
        info!("Job {}: encoding {}", job.id, job.input_path.display());

        let (exit_tx, exit_rx) = crossbeam_channel::bounded::<()>(0);
        control.install(LiveProcess {
            signaller: process.signaller(),
            exited: exit_rx,
        });
        let live = LiveGuard { control, _exit: exit_tx };

        // A cancel that raced the spawn saw no process. The handshake runs on
        // its own thread because the exit notification fires from this one.
        if control.is_cancelled() {
            let (control, timing, id) = (control.clone(), self.timing, job.id);
            thread::spawn(move || {
                let outcome = cancel_job(&control, timing);
                debug!("Job {id}: late cancel ended as {outcome:?}");
            });
        }

        reporter.progress(STATUS_ENCODING);
        let mut tracker = StatusTracker::new(self.warning_hold);

        if let Some(output) = process.take_output() {
            let mut reader = BufReader::new(output);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&buf);
                        self.handle_line(line.trim_end(), &mut tracker, &mut reporter);
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => {
                        warn!("Job {}: reading encoder output failed: {e}", job.id);
                        break;
                    }
                }
            }
        }

        match process.wait() {
            Ok(code) => debug!("Job {}: encoder exit code {code:?}", job.id),
            Err(e) => warn!("Job {}: {e}", job.id),
        }
        drop(live);

        let info = tracker.info();
        let (outcome, text) = if control.is_cancelled() {
            (JobOutcome::Cancelled, STATUS_CANCELLED.to_string())
        } else if info.succeeded() {
            (JobOutcome::Succeeded, STATUS_DONE.to_string())
        } else {
            let reason = info.result.clone().unwrap_or_else(|| STATUS_FAILED.to_string());
            (JobOutcome::Failed, reason)
        };
        info!("Job {}: {text}", job.id);
        reporter.finish(&text);
        outcome
    }

    fn handle_line<F: FnMut(&str)>(
        &self,
        line: &str,
        tracker: &mut StatusTracker,
        reporter: &mut StatusReporter<F>,
    ) {
        match self.parser.parse_line(line) {
            Ok(LineOutcome::Record(record)) => {
                if let Some(status) = tracker.apply(record, Instant::now()) {
                    reporter.progress(&status);
                }
            }
            Ok(LineOutcome::Noise) => trace!("encoder: {line}"),
            Err(e) => debug!("Ignoring progress line: {e}"),
        }
    }
}
