//! Implementation of the 'encode' subcommand.
//!
//! This module checks the inputs, builds the core configuration from the
//! command line, queues every input and drives the encodes to completion
//! while a display shows per-job status.

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use theoraq_core::{
    CancelOutcome, CoreConfig, CoreConfigBuilder, CoreError, EncodeMode, EncodeOptions, EncodeSupervisor,
    JobRunner, QueueDisplay, QueueManager,
};

use crate::cli::EncodeArgs;
use crate::display::{JsonDisplay, SessionDisplay, TerminalDisplay};
use crate::error::{CliErrorContext, CliResult};
use crate::interrupt::install_interrupt_flag;
use crate::summary::EncodeSummary;

/// How long the queue loop waits for a worker message before checking the
/// interrupt flag and idleness again.
const MESSAGE_POLL: Duration = Duration::from_millis(100);

/// Checks the inputs exist and the output flags make sense.
pub fn validate_inputs(args: &EncodeArgs) -> CliResult<()> {
    if args.output.is_some() && args.inputs.len() != 1 {
        return Err(CoreError::Config(
            "--output can only be used with a single input".to_string(),
        ));
    }

    for input in &args.inputs {
        let metadata =
            fs::metadata(input).cli_with_context(|| format!("Cannot read input '{}'", input.display()))?;
        if !metadata.is_file() {
            return Err(CoreError::OperationFailed(format!(
                "Input '{}' is not a file",
                input.display()
            )));
        }
    }

    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)
            .cli_with_context(|| format!("Failed to create output directory '{}'", dir.display()))?;
    }
    Ok(())
}

/// Creates and configures CoreConfig from CLI arguments.
fn create_core_config(args: &EncodeArgs) -> CliResult<CoreConfig> {
    let mut builder = CoreConfigBuilder::new()
        .encoder_path(args.encoder.encoder.clone())
        .progress_format(args.progress_format)
        .mode(args.mode)
        .max_concurrent_jobs(args.jobs);
    if let Some(dir) = &args.output_dir {
        builder = builder.output_dir(dir.clone());
    }

    let config = builder.build();
    config.validate()?;
    Ok(config)
}

/// Applies worker messages until every job has finished.
///
/// Once `interrupted` is raised every unfinished job is cancelled, and the
/// loop keeps going until their final statuses have arrived.
fn wait_for_jobs<D: QueueDisplay>(
    queue: &mut QueueManager<D>,
    supervisor: &EncodeSupervisor,
    interrupted: &AtomicBool,
) {
    let mut cancelled = false;
    loop {
        if !cancelled && interrupted.load(Ordering::SeqCst) {
            cancelled = true;
            warn!("Interrupted, cancelling unfinished jobs");
            for (id, outcome) in queue.cancel_all() {
                if outcome == CancelOutcome::Abandoned {
                    warn!("Encoder for job {id} did not exit");
                } else {
                    debug!("Job {id} cancel: {outcome:?}");
                }
            }
            supervisor.drain_into(queue);
        }

        match supervisor.recv_timeout(MESSAGE_POLL) {
            Some(message) => queue.apply(message),
            None if supervisor.is_idle() => break,
            None => {}
        }
    }
}

/// Queues every input and runs the queue until all jobs have finished.
fn drive_queue<D: SessionDisplay>(
    display: D,
    args: &EncodeArgs,
    options: &EncodeOptions,
    config: &CoreConfig,
    supervisor: &EncodeSupervisor,
    interrupted: &AtomicBool,
) -> EncodeSummary {
    let started = Instant::now();
    let mut queue = QueueManager::new(display, config);

    for input in &args.inputs {
        let id = match &args.output {
            Some(output) => queue.add_job_with_output(input, output, options),
            None => queue.add_job(input, options),
        };
        if let Some(job) = queue.job(id) {
            supervisor.job_added(job);
        }
    }

    if supervisor.mode() == EncodeMode::Batch {
        supervisor.encode_all(&mut queue);
    }
    wait_for_jobs(&mut queue, supervisor, interrupted);

    let summary = EncodeSummary::from_jobs(queue.jobs(), started.elapsed());
    queue.display_mut().finish(&summary);
    summary
}

/// Main entry point for the encode command.
///
/// Returns the summary of the run; the caller maps it to an exit code.
pub fn run_encode(args: EncodeArgs) -> CliResult<EncodeSummary> {
    validate_inputs(&args)?;
    let config = create_core_config(&args)?;
    let interrupted = install_interrupt_flag()?;
    let options = args.options.to_options();
    debug!("Encoder settings: {:?}", options.to_settings());

    let runner = JobRunner::from_config(&config)?;
    info!(
        "Encoding {} file(s) with {} ({} progress, {} mode)",
        args.inputs.len(),
        runner.encoder_path().display(),
        runner.parser_name(),
        config.mode
    );
    let supervisor = EncodeSupervisor::new(runner, &config)?;

    let summary = if args.json {
        drive_queue(JsonDisplay::new(), &args, &options, &config, &supervisor, &interrupted)
    } else {
        drive_queue(TerminalDisplay::new(), &args, &options, &config, &supervisor, &interrupted)
    };

    info!(
        "Finished: {} succeeded, {} failed, {} cancelled",
        summary.succeeded, summary.failed, summary.cancelled
    );
    Ok(summary)
}
