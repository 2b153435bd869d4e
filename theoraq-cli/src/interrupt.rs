//! Ctrl-C handling for an encode session.
//!
//! The handler only raises a flag. The queue loop notices it, cancels every
//! unfinished job and still prints the summary.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use theoraq_core::CoreError;

use crate::error::CliResult;

/// Installs the process-wide interrupt handler and returns its flag.
///
/// # Errors
///
/// Fails when a handler is already installed.
pub fn install_interrupt_flag() -> CliResult<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .map_err(|e| CoreError::OperationFailed(format!("Failed to install interrupt handler: {e}")))?;
    debug!("Interrupt handler installed");
    Ok(flag)
}
