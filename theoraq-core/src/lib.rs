//! Core library for queueing videos and encoding them with ffmpeg2theora.
//!
//! This crate keeps an ordered queue of encode jobs, runs the external
//! encoder for each job on a bounded worker pool, parses its progress output
//! (both the `f2t ;key: value;` lines of older releases and the JSON records
//! of newer ones) and turns it into status text for a front-end.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use theoraq_core::{CoreConfigBuilder, EncodeOptions, EncodeSupervisor, JobRunner, QueueManager};
//! use theoraq_core::queue::QueueDisplay;
//! use theoraq_core::job::EncodeJob;
//!
//! struct PrintDisplay;
//!
//! impl QueueDisplay for PrintDisplay {
//!     fn insert_row(&mut self, _index: usize, job: &EncodeJob) {
//!         println!("queued {}", job.display_path);
//!     }
//!     fn refresh_row(&mut self, _index: usize, job: &EncodeJob) {
//!         println!("{}: {}", job.display_path, job.status);
//!     }
//!     fn refresh_all(&mut self, _jobs: &[EncodeJob], _selection: Option<usize>) {}
//! }
//!
//! let config = CoreConfigBuilder::new().max_concurrent_jobs(1).build();
//! let runner = JobRunner::from_config(&config).unwrap();
//! let supervisor = EncodeSupervisor::new(runner, &config).unwrap();
//!
//! let mut queue = QueueManager::new(PrintDisplay, &config);
//! let options = EncodeOptions { videoquality: Some(6.0), ..Default::default() };
//! queue.add_job("/videos/holiday.dv", &options);
//!
//! supervisor.encode_all(&mut queue);
//! supervisor.run_until_idle(&mut queue);
//! ```

pub mod config;
pub mod encoder;
pub mod error;
pub mod file_logging;
pub mod job;
pub mod options;
pub mod progress;
pub mod queue;
pub mod runner;
pub mod supervisor;

#[cfg(any(test, feature = "test-mocks"))]
pub mod mocks;

// Re-exports for public API
pub use config::{CoreConfig, CoreConfigBuilder, EncodeMode};
pub use encoder::{EncoderCapabilities, probe_encoder};
pub use error::{CoreError, CoreResult};
pub use job::{EncodeJob, JobId, JobOutcome, JobState};
pub use options::EncodeOptions;
pub use progress::{ProgressFormat, timestr};
pub use queue::{QueueDisplay, QueueManager, QueueMessage};
pub use runner::{CancelOutcome, JobRunner};
pub use supervisor::EncodeSupervisor;
