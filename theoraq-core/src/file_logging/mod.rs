//! Log file output for encode sessions.
//!
//! The CLI decides where the file lives; this module only wires the `log`
//! facade to a log4rs file appender.

mod setup;

pub use setup::{LOG_PATTERN, setup_file_logging};
