//! JSON display for structured progress output
//!
//! Writes one JSON object per queue change so other tools can follow an
//! encode session without scraping the terminal rows.

use std::io::{self, Write};

use serde_json::{Value, json};
use theoraq_core::QueueDisplay;
use theoraq_core::job::EncodeJob;

use super::SessionDisplay;
use crate::summary::EncodeSummary;

/// Display that outputs queue events as JSON lines
pub struct JsonDisplay<W: Write = io::Stdout> {
    output: W,
}

impl Default for JsonDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonDisplay {
    /// Create a JSON display that writes to stdout
    pub fn new() -> Self {
        Self { output: io::stdout() }
    }
}

impl<W: Write> JsonDisplay<W> {
    pub fn with_writer(output: W) -> Self {
        Self { output }
    }

    pub fn into_inner(self) -> W {
        self.output
    }

    fn write_json(&mut self, mut value: Value) {
        value["timestamp"] = json!(chrono::Utc::now().timestamp());
        if let Ok(line) = serde_json::to_string(&value) {
            let _ = writeln!(self.output, "{line}");
            let _ = self.output.flush();
        }
    }
}

fn job_json(job: &EncodeJob) -> Value {
    json!({
        "id": job.id,
        "state": job.state,
        "status": job.status,
    })
}

impl<W: Write> QueueDisplay for JsonDisplay<W> {
    fn insert_row(&mut self, index: usize, job: &EncodeJob) {
        self.write_json(json!({
            "type": "job_added",
            "index": index,
            "id": job.id,
            "input": job.input_path,
            "output": job.output_path,
            "settings": job.settings,
        }));
    }

    fn refresh_row(&mut self, _index: usize, job: &EncodeJob) {
        let mut event = job_json(job);
        event["type"] = json!("job_status");
        self.write_json(event);
    }

    fn refresh_all(&mut self, jobs: &[EncodeJob], selection: Option<usize>) {
        self.write_json(json!({
            "type": "queue",
            "jobs": jobs.iter().map(job_json).collect::<Vec<_>>(),
            "selection": selection,
        }));
    }
}

impl<W: Write> SessionDisplay for JsonDisplay<W> {
    fn finish(&mut self, summary: &EncodeSummary) {
        let mut event = json!(summary);
        event["type"] = json!("summary");
        self.write_json(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use theoraq_core::{CoreConfig, EncodeOptions, JobOutcome, QueueManager, QueueMessage};

    fn events(display: JsonDisplay<Vec<u8>>) -> Vec<Value> {
        String::from_utf8(display.into_inner())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_queue_events_are_json_lines() {
        let mut queue = QueueManager::new(JsonDisplay::with_writer(Vec::new()), &CoreConfig::default());
        let options = EncodeOptions {
            videoquality: Some(5.0),
            ..Default::default()
        };
        let id = queue.add_job("/v/a.avi", &options);
        queue.apply(QueueMessage::Started { id });
        queue.apply(QueueMessage::Status { id, text: "encoding..".to_string() });
        queue.apply(QueueMessage::Finished { id, outcome: JobOutcome::Failed });
        queue.remove_job(id).unwrap();

        let summary = EncodeSummary::from_jobs(queue.jobs(), Duration::from_secs(1));
        let mut display = std::mem::replace(queue.display_mut(), JsonDisplay::with_writer(Vec::new()));
        display.finish(&summary);

        let events = events(display);
        let types: Vec<_> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
        assert_eq!(
            types,
            vec!["job_added", "job_status", "job_status", "job_status", "queue", "summary"]
        );
        assert_eq!(events[0]["id"], 1);
        assert_eq!(events[0]["settings"], json!(["--videoquality", "5.0"]));
        assert_eq!(events[1]["state"], "encoding");
        assert_eq!(events[2]["status"], "encoding..");
        assert_eq!(events[3]["state"], "failed");
        assert_eq!(events[4]["jobs"], json!([]));
        assert_eq!(events[4]["selection"], Value::Null);
        assert_eq!(events[5]["total"], 0);
        assert!(events.iter().all(|e| e["timestamp"].is_i64()));
    }
}
