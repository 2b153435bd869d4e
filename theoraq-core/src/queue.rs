// ============================================================================
// theoraq-core/src/queue.rs
// ============================================================================
//
// QUEUE MANAGER: Ordered Job Collection Owned by the UI Thread
//
// The queue owns every EncodeJob, the display status of each and the current
// selection. It is never shared: workers report through QueueMessage values
// that the UI thread applies here, and every visible change is pushed to a
// QueueDisplay (the list widget of a front-end).
//
// KEY COMPONENTS:
// - QueueManager: add / remove / select / status updates
// - QueueDisplay: row-level rendering seam
// - QueueMessage: worker-to-queue notifications

use std::path::PathBuf;

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::job::{EncodeJob, JobControl, JobId, JobOutcome, JobSpec, JobState};
use crate::options::EncodeOptions;
use crate::runner::{CancelOutcome, CancelTiming, cancel_job};

/// Status of a job that has not started yet.
pub const STATUS_WAITING: &str = "waiting";

/// Extension the encoder gives its output files.
pub const OUTPUT_EXTENSION: &str = "ogv";

/// Rendering seam for the queue's rows.
pub trait QueueDisplay {
    /// A job was appended at `index`.
    fn insert_row(&mut self, index: usize, job: &EncodeJob);

    /// The status or state of the job at `index` changed.
    fn refresh_row(&mut self, index: usize, job: &EncodeJob);

    /// Rows were removed; redraw everything.
    fn refresh_all(&mut self, jobs: &[EncodeJob], selection: Option<usize>);
}

/// Notification from a worker about one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum QueueMessage {
    Started { id: JobId },
    Status { id: JobId, text: String },
    Finished { id: JobId, outcome: JobOutcome },
}

pub struct QueueManager<D: QueueDisplay> {
    jobs: Vec<EncodeJob>,
    last_id: u64,
    selection: Option<usize>,
    display: D,
    timing: CancelTiming,
    output_dir: Option<PathBuf>,
}

impl<D: QueueDisplay> QueueManager<D> {
    pub fn new(display: D, config: &CoreConfig) -> Self {
        Self {
            jobs: Vec::new(),
            last_id: 0,
            selection: None,
            display,
            timing: CancelTiming::from_config(config),
            output_dir: config.output_dir.clone(),
        }
    }

    /// Queues `input` and returns the new job's id.
    ///
    /// With an output directory configured the job writes
    /// `<dir>/<input stem>.ogv`; otherwise the encoder picks the output name.
    pub fn add_job(&mut self, input: impl Into<PathBuf>, options: &EncodeOptions) -> JobId {
        let input = input.into();
        let output = self.output_dir.as_ref().and_then(|dir| {
            input.file_stem().map(|stem| {
                let mut name = stem.to_os_string();
                name.push(".");
                name.push(OUTPUT_EXTENSION);
                dir.join(name)
            })
        });
        self.push(input, output, options)
    }

    /// Queues `input` with an explicit `-o` target.
    pub fn add_job_with_output(
        &mut self,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        options: &EncodeOptions,
    ) -> JobId {
        self.push(input.into(), Some(output.into()), options)
    }

    fn push(&mut self, input: PathBuf, output: Option<PathBuf>, options: &EncodeOptions) -> JobId {
        // Counter, not max+1: ids of removed jobs are never handed out again.
        self.last_id += 1;
        let id = JobId(self.last_id);

        let job = EncodeJob::new(id, input, output, options.to_settings(), STATUS_WAITING);
        debug!("Queued job {id}: {}", job.input_path.display());
        self.jobs.push(job);

        let index = self.jobs.len() - 1;
        self.display.insert_row(index, &self.jobs[index]);
        id
    }

    /// Cancels the job if it is running, then removes it.
    ///
    /// Blocks until the process is confirmed dead or the cancellation
    /// handshake gives up; an abandoned process does not prevent removal.
    ///
    /// # Errors
    ///
    /// * `CoreError::JobNotFound` - no job with this id is queued
    pub fn remove_job(&mut self, id: JobId) -> CoreResult<CancelOutcome> {
        let index = self.index_of(id).ok_or(CoreError::JobNotFound(id))?;

        let outcome = cancel_job(&self.jobs[index].control, self.timing);
        if outcome == CancelOutcome::Abandoned {
            warn!("Job {id} removed while its encoder is still running");
        }

        self.jobs.remove(index);
        self.selection = match (self.selection, self.jobs.len()) {
            (_, 0) => None,
            (Some(selected), count) => Some(selected.min(count - 1)),
            (None, _) => None,
        };
        info!("Removed job {id} ({outcome:?})");

        self.display.refresh_all(&self.jobs, self.selection);
        Ok(outcome)
    }

    /// Stores new status text for a job and refreshes its row.
    ///
    /// Returns false when nothing changed, including for jobs that were
    /// removed while their worker was still reporting.
    pub fn update_status(&mut self, id: JobId, text: &str) -> bool {
        let Some(index) = self.index_of(id) else {
            debug!("Status for unknown job {id} dropped");
            return false;
        };
        let job = &mut self.jobs[index];
        if job.status == text {
            return false;
        }
        job.status = text.to_string();
        self.display.refresh_row(index, &self.jobs[index]);
        true
    }

    /// Records the selection at display `index` and returns that job's id.
    pub fn select_job(&mut self, index: usize) -> Option<JobId> {
        let id = self.jobs.get(index)?.id;
        self.selection = Some(index);
        Some(id)
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn jobs(&self) -> &[EncodeJob] {
        &self.jobs
    }

    pub fn job(&self, id: JobId) -> Option<&EncodeJob> {
        self.jobs.iter().find(|job| job.id == id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// Applies a worker notification.
    pub fn apply(&mut self, message: QueueMessage) {
        match message {
            QueueMessage::Status { id, text } => {
                self.update_status(id, &text);
            }
            QueueMessage::Started { id } => self.transition(id, JobState::Encoding),
            QueueMessage::Finished { id, outcome } => {
                if let Some(job) = self.job(id) {
                    job.control.unschedule();
                }
                self.transition(id, outcome.into());
            }
        }
    }

    /// Moves a job forward in its lifecycle; never backwards.
    fn transition(&mut self, id: JobId, next: JobState) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        let job = &mut self.jobs[index];
        let allowed = match next {
            JobState::Waiting => false,
            JobState::Encoding => job.state == JobState::Waiting,
            _ => !job.state.is_terminal(),
        };
        if !allowed {
            debug!("Job {id}: ignoring {:?} -> {next:?}", job.state);
            return;
        }
        job.state = next;
        self.display.refresh_row(index, &self.jobs[index]);
    }

    /// Claims the jobs a batch run should encode, in queue order.
    ///
    /// Succeeded jobs and jobs already handed to a worker are skipped.
    /// Failed and cancelled jobs are reset to waiting so they run again.
    pub fn prepare_batch(&mut self) -> Vec<(JobSpec, JobControl)> {
        let mut batch = Vec::new();
        for index in 0..self.jobs.len() {
            let job = &mut self.jobs[index];
            if job.control.is_scheduled() {
                continue;
            }
            match job.state {
                JobState::Succeeded | JobState::Encoding => continue,
                JobState::Failed | JobState::Cancelled => {
                    job.state = JobState::Waiting;
                    job.status = STATUS_WAITING.to_string();
                    job.control.reset();
                    self.display.refresh_row(index, &self.jobs[index]);
                }
                JobState::Waiting => {}
            }
            let job = &self.jobs[index];
            if job.control.try_schedule() {
                batch.push((job.spec(), job.control.clone()));
            }
        }
        batch
    }

    /// Asks every unfinished job to cancel, live encoders in parallel.
    pub fn cancel_all(&mut self) -> Vec<(JobId, CancelOutcome)> {
        let timing = self.timing;
        let pending: Vec<(JobId, JobControl)> = self
            .jobs
            .iter()
            .filter(|job| !job.state.is_terminal())
            .map(|job| (job.id, job.control.clone()))
            .collect();

        std::thread::scope(|scope| {
            let handles: Vec<_> = pending
                .iter()
                .map(|(id, control)| (*id, scope.spawn(move || cancel_job(control, timing))))
                .collect();
            handles
                .into_iter()
                .map(|(id, handle)| (id, handle.join().unwrap_or(CancelOutcome::Abandoned)))
                .collect()
        })
    }

    fn index_of(&self, id: JobId) -> Option<usize> {
        self.jobs.iter().position(|job| job.id == id)
    }
}
