// theoraq-cli/src/lib.rs
//
// Library portion of the theoraq CLI application.
// Contains argument definitions, displays and command logic.

pub mod cli;
pub mod commands;
pub mod display;
pub mod error;
pub mod interrupt;
pub mod logging;
pub mod summary;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, EncodeArgs, ProbeArgs};
pub use commands::encode::run_encode;
pub use commands::probe::run_probe;
pub use error::CliResult;
pub use summary::EncodeSummary;
