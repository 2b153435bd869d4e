//! End-of-run summary of an encode session.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use theoraq_core::job::{EncodeJob, JobId, JobState};

/// Final state of one job.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub id: JobId,
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub state: JobState,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EncodeSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub elapsed_seconds: f64,
    pub jobs: Vec<JobReport>,
}

impl EncodeSummary {
    pub fn from_jobs(jobs: &[EncodeJob], elapsed: Duration) -> Self {
        let count = |state: JobState| jobs.iter().filter(|job| job.state == state).count();
        Self {
            total: jobs.len(),
            succeeded: count(JobState::Succeeded),
            failed: count(JobState::Failed),
            cancelled: count(JobState::Cancelled),
            elapsed_seconds: elapsed.as_secs_f64(),
            jobs: jobs
                .iter()
                .map(|job| JobReport {
                    id: job.id,
                    input: job.input_path.clone(),
                    output: job.output_path.clone(),
                    state: job.state,
                    status: job.status.clone(),
                })
                .collect(),
        }
    }

    /// True when at least one job ran and every job succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.total > 0 && self.succeeded == self.total
    }
}
