// ============================================================================
// theoraq-core/src/supervisor.rs
// ============================================================================
//
// ENCODE SUPERVISOR: Worker Pool and Message Channel
//
// The supervisor runs jobs on a bounded rayon pool and forwards everything
// the runner reports to the UI thread as QueueMessage values over a
// crossbeam channel. Workers never touch the queue; the UI thread drains the
// channel and applies each message to its QueueManager.
//
// KEY COMPONENTS:
// - EncodeSupervisor: submit (immediate mode), encode_all (batch mode)
// - Message draining helpers for the UI thread

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, info};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::{CoreConfig, EncodeMode};
use crate::error::{CoreError, CoreResult};
use crate::job::{EncodeJob, JobControl, JobOutcome, JobSpec};
use crate::queue::{QueueDisplay, QueueManager, QueueMessage};
use crate::runner::JobRunner;

/// How often `run_until_idle` re-checks for idleness while no message arrives.
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Counts a submitted task until it finishes, even by panic.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct EncodeSupervisor {
    runner: Arc<JobRunner>,
    pool: ThreadPool,
    mode: EncodeMode,
    in_flight: Arc<AtomicUsize>,
    tx: Sender<QueueMessage>,
    rx: Receiver<QueueMessage>,
}

impl EncodeSupervisor {
    /// Creates a supervisor with `config.max_concurrent_jobs` workers.
    ///
    /// # Errors
    ///
    /// * `CoreError::Config` - the configuration is invalid
    /// * `CoreError::WorkerPool` - the thread pool could not be built
    pub fn new(runner: JobRunner, config: &CoreConfig) -> CoreResult<Self> {
        config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.max_concurrent_jobs)
            .thread_name(|i| format!("theoraq-worker-{i}"))
            .build()
            .map_err(|e| CoreError::WorkerPool(e.to_string()))?;
        let (tx, rx) = crossbeam_channel::unbounded();

        debug!(
            "Encode supervisor ready: {} workers, {} mode",
            config.max_concurrent_jobs, config.mode
        );
        Ok(Self {
            runner: Arc::new(runner),
            pool,
            mode: config.mode,
            in_flight: Arc::new(AtomicUsize::new(0)),
            tx,
            rx,
        })
    }

    pub fn mode(&self) -> EncodeMode {
        self.mode
    }

    pub fn runner(&self) -> &JobRunner {
        &self.runner
    }

    /// Hook for freshly added jobs: starts them right away in immediate mode.
    /// Returns whether the job was submitted.
    pub fn job_added(&self, job: &EncodeJob) -> bool {
        self.mode == EncodeMode::Immediate && self.submit(job)
    }

    /// Hands one job to the pool.
    ///
    /// Returns false without scheduling anything when the job is already
    /// scheduled and its `Finished` message has not been applied yet.
    pub fn submit(&self, job: &EncodeJob) -> bool {
        if !job.control().try_schedule() {
            debug!("Job {} is already scheduled", job.id);
            return false;
        }
        let (spec, control) = (job.spec(), job.control().clone());
        let (runner, tx) = (Arc::clone(&self.runner), self.tx.clone());
        let guard = InFlight::enter(&self.in_flight);

        self.pool.spawn(move || {
            let _guard = guard;
            run_job(&runner, &tx, &spec, &control);
        });
        true
    }

    /// Runs the queue's pending jobs one at a time, in queue order.
    ///
    /// Jobs already handed to a worker are left alone. Returns the number
    /// of jobs scheduled.
    pub fn encode_all<D: QueueDisplay>(&self, queue: &mut QueueManager<D>) -> usize {
        let batch = queue.prepare_batch();
        let count = batch.len();
        if count == 0 {
            return 0;
        }
        info!("Encoding {count} queued job(s)");

        let (runner, tx) = (Arc::clone(&self.runner), self.tx.clone());
        let guard = InFlight::enter(&self.in_flight);
        self.pool.spawn(move || {
            let _guard = guard;
            for (spec, control) in &batch {
                run_job(&runner, &tx, spec, control);
            }
        });
        count
    }

    /// True when no task is running and every message has been received.
    pub fn is_idle(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) == 0 && self.rx.is_empty()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<QueueMessage> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Applies every message already waiting. Returns how many there were.
    pub fn drain_into<D: QueueDisplay>(&self, queue: &mut QueueManager<D>) -> usize {
        let mut applied = 0;
        while let Ok(message) = self.rx.try_recv() {
            queue.apply(message);
            applied += 1;
        }
        applied
    }

    /// Applies messages as they arrive until all submitted work has finished.
    pub fn run_until_idle<D: QueueDisplay>(&self, queue: &mut QueueManager<D>) {
        loop {
            match self.rx.recv_timeout(IDLE_POLL) {
                Ok(message) => queue.apply(message),
                Err(RecvTimeoutError::Timeout) if self.is_idle() => break,
                Err(RecvTimeoutError::Timeout) => {}
                // The supervisor holds a sender, so this cannot happen while it lives.
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }
}

fn run_job(runner: &JobRunner, tx: &Sender<QueueMessage>, spec: &JobSpec, control: &JobControl) -> JobOutcome {
    let id = spec.id;
    // Send errors mean the UI side is gone; the encode still runs to completion.
    let _ = tx.send(QueueMessage::Started { id });
    let outcome = runner.run(spec, control, |text| {
        let _ = tx.send(QueueMessage::Status {
            id,
            text: text.to_string(),
        });
    });
    let _ = tx.send(QueueMessage::Finished { id, outcome });
    outcome
}
