//! Front-ends for the queue: live rows in the terminal or JSON lines.

mod json;
mod terminal;

pub use json::JsonDisplay;
pub use terminal::TerminalDisplay;

use theoraq_core::QueueDisplay;

use crate::summary::EncodeSummary;

/// A queue display that also reports the end of the session.
pub trait SessionDisplay: QueueDisplay {
    fn finish(&mut self, summary: &EncodeSummary);
}
