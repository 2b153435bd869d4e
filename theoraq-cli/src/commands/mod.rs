//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Queues inputs and encodes them with live status rows.
pub mod encode;

/// Reports the installed encoder's version and capabilities.
pub mod probe;
