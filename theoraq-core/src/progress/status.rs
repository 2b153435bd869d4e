//! Turns accumulated progress into the status text shown for a job.

use std::time::{Duration, Instant};

use super::{ProgressInfo, ProgressRecord};

/// Status shown while the encoder has not reported a position yet.
pub const STATUS_ENCODING: &str = "encoding..";

/// Formats seconds as `HH:MM:SS`, truncating fractions.
pub fn timestr(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 { seconds as u64 } else { 0 };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Running progress state of one encode.
#[derive(Debug, Clone)]
pub struct StatusTracker {
    info: ProgressInfo,
    warning_hold: Duration,
    warning_until: Option<Instant>,
}

impl StatusTracker {
    pub fn new(warning_hold: Duration) -> Self {
        Self {
            info: ProgressInfo::default(),
            warning_hold,
            warning_until: None,
        }
    }

    pub fn info(&self) -> &ProgressInfo {
        &self.info
    }

    /// Merges one record and returns the status to show, if any.
    ///
    /// A warning replaces the status and holds it for the configured time;
    /// progress records arriving during the hold produce no status.
    pub fn apply(&mut self, record: ProgressRecord, now: Instant) -> Option<String> {
        self.info.merge(record);

        if let Some(warning) = self.info.warning.take() {
            self.warning_until = Some(now + self.warning_hold);
            return Some(warning);
        }

        if self.warning_until.is_some_and(|until| now < until) {
            return None;
        }
        self.warning_until = None;

        Some(self.progress_text())
    }

    fn progress_text(&self) -> String {
        let Some(position) = self.info.position else {
            return STATUS_ENCODING.to_string();
        };

        let encoded = match self.info.duration.filter(|d| *d != 0.0) {
            Some(duration) => {
                let percent = (position / duration * 100.0) as i64;
                format!("encoding {percent:>3} % done ")
            }
            None => format!("encoded {}/", timestr(position)),
        };

        match self.info.remaining.filter(|r| *r > 0.0) {
            Some(remaining) => format!("{encoded}/ {}", timestr(remaining)),
            None => encoded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLD: Duration = Duration::from_secs(3);

    fn progress(position: f64, duration: Option<f64>, remaining: Option<f64>) -> ProgressRecord {
        ProgressRecord {
            position: Some(position),
            duration,
            remaining,
            ..Default::default()
        }
    }

    #[test]
    fn test_timestr() {
        assert_eq!(timestr(0.0), "00:00:00");
        assert_eq!(timestr(3661.0), "01:01:01");
        assert_eq!(timestr(59.99), "00:00:59");
        assert_eq!(timestr(36000.0 * 10.0), "100:00:00");
        assert_eq!(timestr(-4.0), "00:00:00");
    }

    #[test]
    fn test_percent_with_remaining() {
        let mut tracker = StatusTracker::new(HOLD);
        let status = tracker
            .apply(progress(30.0, Some(120.0), Some(90.0)), Instant::now())
            .unwrap();
        assert!(status.contains("25 % done"), "{status}");
        assert_eq!(status, "encoding  25 % done / 00:01:30");
    }

    #[test]
    fn test_zero_remaining_drops_suffix() {
        let mut tracker = StatusTracker::new(HOLD);
        let status = tracker
            .apply(progress(30.0, Some(120.0), Some(0.0)), Instant::now())
            .unwrap();
        assert_eq!(status, "encoding  25 % done ");
    }

    #[test]
    fn test_unknown_duration_shows_encoded_time() {
        let mut tracker = StatusTracker::new(HOLD);
        let now = Instant::now();
        let status = tracker.apply(progress(75.0, Some(0.0), Some(15.0)), now).unwrap();
        assert_eq!(status, "encoded 00:01:15// 00:00:15");

        let status = tracker.apply(progress(80.0, None, Some(0.0)), now).unwrap();
        assert_eq!(status, "encoded 00:01:20/");
    }

    #[test]
    fn test_no_position_means_encoding() {
        let mut tracker = StatusTracker::new(HOLD);
        let record = ProgressRecord { duration: Some(10.0), ..Default::default() };
        assert_eq!(tracker.apply(record, Instant::now()).as_deref(), Some(STATUS_ENCODING));
    }

    #[test]
    fn test_warning_holds_status_for_three_seconds() {
        let mut tracker = StatusTracker::new(HOLD);
        let start = Instant::now();

        let warning = ProgressRecord { warning: Some("Bad frame".to_string()), ..Default::default() };
        assert_eq!(tracker.apply(warning, start).as_deref(), Some("Bad frame"));
        assert!(tracker.info().warning.is_none());

        let during = tracker.apply(progress(10.0, Some(100.0), None), start + Duration::from_secs(2));
        assert_eq!(during, None);

        let after = tracker.apply(progress(20.0, Some(100.0), None), start + Duration::from_secs(3));
        assert_eq!(after.as_deref(), Some("encoding  20 % done "));
    }

    #[test]
    fn test_percent_is_truncated() {
        let mut tracker = StatusTracker::new(HOLD);
        let status = tracker.apply(progress(2.0, Some(3.0), None), Instant::now()).unwrap();
        assert_eq!(status, "encoding  66 % done ");
    }
}
