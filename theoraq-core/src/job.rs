// ============================================================================
// theoraq-core/src/job.rs
// ============================================================================
//
// JOBS: Encode Job Records and Per-Job Control
//
// An EncodeJob is one queued request to transcode a single input file with a
// fixed settings snapshot. JobControl is the handle shared between the queue
// (UI thread) and the worker running the job; it carries the cancel flag and
// the live process slot used by cancellation.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam_channel::Receiver;
use serde::Serialize;

use crate::encoder::ProcessSignaller;
use crate::error::CoreResult;

/// Maximum number of characters of a path shown in a queue row.
pub const DISPLAY_PATH_MAX: usize = 25;

/// Unique, never reused job key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle position of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Waiting,
    Encoding,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

/// How a single run of the encoder ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    Succeeded,
    Failed,
    Cancelled,
}

impl From<JobOutcome> for JobState {
    fn from(outcome: JobOutcome) -> Self {
        match outcome {
            JobOutcome::Succeeded => Self::Succeeded,
            JobOutcome::Failed => Self::Failed,
            JobOutcome::Cancelled => Self::Cancelled,
        }
    }
}

/// One queued encode.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub id: JobId,
    pub input_path: PathBuf,
    pub display_path: String,
    pub output_path: Option<PathBuf>,
    pub settings: Vec<String>,
    pub status: String,
    pub state: JobState,
    pub(crate) control: JobControl,
}

impl EncodeJob {
    pub(crate) fn new(
        id: JobId,
        input_path: PathBuf,
        output_path: Option<PathBuf>,
        settings: Vec<String>,
        status: impl Into<String>,
    ) -> Self {
        let display_path = elide_path(&input_path, DISPLAY_PATH_MAX);
        Self {
            id,
            input_path,
            display_path,
            output_path,
            settings,
            status: status.into(),
            state: JobState::Waiting,
            control: JobControl::new(),
        }
    }

    /// The control handle a worker needs to run and cancel this job.
    pub fn control(&self) -> &JobControl {
        &self.control
    }

    /// Immutable snapshot handed to a worker.
    pub fn spec(&self) -> JobSpec {
        JobSpec {
            id: self.id,
            input_path: self.input_path.clone(),
            output_path: self.output_path.clone(),
            settings: self.settings.clone(),
        }
    }
}

/// The part of a job a worker needs; owned so it can cross threads.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec {
    pub id: JobId,
    pub input_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub settings: Vec<String>,
}

/// A process that is currently running for a job.
pub(crate) struct LiveProcess {
    pub(crate) signaller: Arc<dyn ProcessSignaller>,
    /// Disconnects once the process has been reaped.
    pub(crate) exited: Receiver<()>,
}

/// Cancel flag, scheduling claim and live process slot, shared by queue and worker.
#[derive(Clone, Default)]
pub struct JobControl {
    cancelled: Arc<AtomicBool>,
    /// Set on the UI thread when the job is handed to a worker, cleared when
    /// its `Finished` message is applied.
    scheduled: Arc<AtomicBool>,
    live: Arc<Mutex<Option<LiveProcess>>>,
}

impl fmt::Debug for JobControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobControl")
            .field("cancelled", &self.is_cancelled())
            .field("scheduled", &self.is_scheduled())
            .field("running", &self.is_running())
            .finish()
    }
}

impl JobControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_cancelled(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Clears a previous cancellation so the job can be queued again.
    pub(crate) fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled.load(Ordering::SeqCst)
    }

    /// Claims the job for one worker. Fails while an earlier claim is held.
    pub(crate) fn try_schedule(&self) -> bool {
        self.scheduled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn unschedule(&self) {
        self.scheduled.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.slot().is_some()
    }

    pub(crate) fn install(&self, process: LiveProcess) {
        *self.slot() = Some(process);
    }

    pub(crate) fn clear(&self) {
        self.slot().take();
    }

    /// Exit notification of the live process, if one is running.
    pub(crate) fn exit_notifier(&self) -> Option<Receiver<()>> {
        self.slot().as_ref().map(|live| live.exited.clone())
    }

    /// Signals the live process while holding the slot lock, so a process
    /// whose slot was already cleared is never signalled. `None` when no
    /// process is installed.
    pub(crate) fn signal_live(&self, force: bool) -> Option<CoreResult<()>> {
        let slot = self.slot();
        let live = slot.as_ref()?;
        Some(if force {
            live.signaller.kill()
        } else {
            live.signaller.terminate()
        })
    }

    fn slot(&self) -> MutexGuard<'_, Option<LiveProcess>> {
        // A worker that panicked mid-update leaves nothing inconsistent in an Option.
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Shortens a path for display: long paths keep their tail behind `...`.
pub fn elide_path(path: &Path, max_chars: usize) -> String {
    let full = path.display().to_string();
    let count = full.chars().count();
    if count <= max_chars || max_chars == 0 {
        return full;
    }
    let keep = max_chars - 1;
    let tail: String = full.chars().skip(count - keep).collect();
    format!("...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_paths_are_untouched() {
        assert_eq!(elide_path(Path::new("/tmp/a.avi"), DISPLAY_PATH_MAX), "/tmp/a.avi");
    }

    #[test]
    fn test_long_paths_keep_tail() {
        let path = Path::new("/home/user/videos/holiday/2008/beach.dv");
        let shown = elide_path(path, DISPLAY_PATH_MAX);
        assert!(shown.starts_with("..."));
        assert!(shown.ends_with("holiday/2008/beach.dv"));
        assert_eq!(shown.chars().count(), 3 + 24);
    }

    #[test]
    fn test_elision_counts_characters_not_bytes() {
        let path = Path::new("/médias/vidéos/été/été-à-la-plage.ogv");
        let shown = elide_path(path, 10);
        assert_eq!(shown.chars().count(), 12);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::Waiting.is_terminal());
        assert!(!JobState::Encoding.is_terminal());
        assert!(JobState::Succeeded.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::Cancelled.is_terminal());
        assert_eq!(JobState::from(JobOutcome::Cancelled), JobState::Cancelled);
    }

    #[test]
    fn test_control_cancel_and_reset() {
        let control = JobControl::new();
        assert!(!control.is_cancelled());
        assert!(!control.is_running());
        control.mark_cancelled();
        assert!(control.clone().is_cancelled());
        control.reset();
        assert!(!control.is_cancelled());
    }

    #[test]
    fn test_schedule_claim_is_exclusive() {
        let control = JobControl::new();
        let worker_view = control.clone();
        assert!(control.try_schedule());
        assert!(!worker_view.try_schedule());
        assert!(worker_view.is_scheduled());

        control.unschedule();
        assert!(worker_view.try_schedule());
    }

    #[test]
    fn test_signal_without_process() {
        assert!(JobControl::new().signal_live(true).is_none());
    }
}
