//! One JSON object per line, written to stdout by current encoders.

use serde::Deserialize;

use super::{LineOutcome, LineParser, OutputStream, ProgressRecord};
use crate::error::{CoreError, CoreResult};

/// Parser for the line-delimited JSON grammar.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRecordParser;

/// Numbers sometimes arrive quoted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Seconds {
    Number(f64),
    Text(String),
}

impl Seconds {
    fn into_f64(self, key: &str) -> CoreResult<f64> {
        match self {
            Self::Number(value) => Ok(value),
            Self::Text(text) => text.trim().parse::<f64>().map_err(|_| {
                CoreError::ProgressParse(format!("{key} is not a number: '{text}'"))
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    position: Option<Seconds>,
    duration: Option<Seconds>,
    remaining: Option<Seconds>,
    #[serde(rename = "WARNING")]
    warning: Option<String>,
    result: Option<String>,
}

impl LineParser for JsonRecordParser {
    fn parse_line(&self, line: &str) -> CoreResult<LineOutcome> {
        let line = line.trim();
        if !line.starts_with('{') {
            return Ok(LineOutcome::Noise);
        }

        let raw: RawRecord = serde_json::from_str(line)
            .map_err(|e| CoreError::ProgressParse(format!("{e}: {line}")))?;

        let seconds = |value: Option<Seconds>, key: &str| value.map(|v| v.into_f64(key)).transpose();
        Ok(LineOutcome::Record(ProgressRecord {
            position: seconds(raw.position, "position")?,
            duration: seconds(raw.duration, "duration")?,
            remaining: seconds(raw.remaining, "remaining")?,
            warning: raw.warning,
            result: raw.result,
        }))
    }

    fn stream(&self) -> OutputStream {
        OutputStream::Stdout
    }

    fn name(&self) -> &'static str {
        "json"
    }
}
