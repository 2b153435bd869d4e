// ============================================================================
// theoraq-cli/src/display/terminal.rs
// ============================================================================
//
// TERMINAL DISPLAY: One Spinner Row per Queued Job
//
// Each job gets an indicatif row in a MultiProgress showing its elided path
// and status text. Rows of finished jobs stop spinning and keep their final
// status. When stderr is not a terminal the rows are hidden and the final
// statuses are printed with the summary instead.

use std::io::IsTerminal;
use std::time::Duration;

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use theoraq_core::job::{EncodeJob, JobState};
use theoraq_core::{QueueDisplay, timestr};

use super::SessionDisplay;
use crate::summary::EncodeSummary;

const TICK: Duration = Duration::from_millis(120);

/// Width of the path column; elided paths are at most 27 characters.
const PATH_COLUMN: usize = 28;

pub struct TerminalDisplay {
    multi: MultiProgress,
    rows: Vec<ProgressBar>,
    visible: bool,
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalDisplay {
    pub fn new() -> Self {
        let visible = std::io::stderr().is_terminal();
        let multi = if visible {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };
        Self {
            multi,
            rows: Vec::new(),
            visible,
        }
    }

    fn new_row(&self, index: usize, job: &EncodeJob, selected: bool) -> ProgressBar {
        let row = self.multi.insert(index, ProgressBar::new_spinner());
        let marker = if selected { ">" } else { " " };
        row.set_prefix(format!("{marker}{:>3}", job.id));
        render(&row, job);
        row
    }
}

fn active_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {prefix:.bold.dim} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn done_style() -> ProgressStyle {
    ProgressStyle::with_template("  {prefix:.bold.dim} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn styled_status(job: &EncodeJob) -> String {
    match job.state {
        JobState::Succeeded => style(&job.status).green().to_string(),
        JobState::Failed => style(&job.status).red().to_string(),
        JobState::Cancelled => style(&job.status).yellow().to_string(),
        JobState::Waiting => style(&job.status).dim().to_string(),
        JobState::Encoding => job.status.clone(),
    }
}

fn render(row: &ProgressBar, job: &EncodeJob) {
    let message = format!("{:<PATH_COLUMN$} {}", job.display_path, styled_status(job));
    if job.state.is_terminal() {
        row.set_style(done_style());
        row.finish_with_message(message);
        return;
    }
    row.set_style(active_style());
    row.set_message(message);
    if job.state == JobState::Encoding {
        row.enable_steady_tick(TICK);
    }
}

impl QueueDisplay for TerminalDisplay {
    fn insert_row(&mut self, index: usize, job: &EncodeJob) {
        let row = self.new_row(index, job, false);
        self.rows.insert(index, row);
    }

    fn refresh_row(&mut self, index: usize, job: &EncodeJob) {
        if let Some(row) = self.rows.get(index) {
            render(row, job);
        }
    }

    fn refresh_all(&mut self, jobs: &[EncodeJob], selection: Option<usize>) {
        for row in self.rows.drain(..) {
            row.finish_and_clear();
            self.multi.remove(&row);
        }
        let rows: Vec<_> = jobs
            .iter()
            .enumerate()
            .map(|(index, job)| self.new_row(index, job, selection == Some(index)))
            .collect();
        self.rows = rows;
    }
}

impl SessionDisplay for TerminalDisplay {
    fn finish(&mut self, summary: &EncodeSummary) {
        if !self.visible {
            for job in &summary.jobs {
                println!("{:>4} {} {}", job.id, job.input.display(), job.status);
            }
        }

        let headline = format!(
            "Encoded {} of {} file(s) in {}",
            summary.succeeded,
            summary.total,
            timestr(summary.elapsed_seconds)
        );
        if summary.all_succeeded() {
            println!("{}", style(headline).green().bold());
        } else {
            println!("{}", style(headline).red().bold());
            if summary.failed > 0 {
                println!("  {} failed", style(summary.failed).red());
            }
            if summary.cancelled > 0 {
                println!("  {} cancelled", style(summary.cancelled).yellow());
            }
        }
    }
}
