//! `f2t ;key: value;...` progress lines, written to stderr by older encoders.

use super::{LineOutcome, LineParser, OutputStream, ProgressRecord};
use crate::error::{CoreError, CoreResult};

/// Leading token of every key/value progress line.
pub const KEY_VALUE_PREFIX: &str = "f2t";

/// Parser for the semicolon-delimited grammar.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyValueParser;

impl LineParser for KeyValueParser {
    fn parse_line(&self, line: &str) -> CoreResult<LineOutcome> {
        let Some(rest) = line.trim().strip_prefix(KEY_VALUE_PREFIX) else {
            return Ok(LineOutcome::Noise);
        };
        let rest = rest.trim_start();
        if !rest.is_empty() && !rest.starts_with(';') {
            return Ok(LineOutcome::Noise);
        }

        let mut record = ProgressRecord::default();
        for field in rest.split(';').map(str::trim).filter(|f| !f.is_empty()) {
            let (key, value) = field
                .split_once(':')
                .ok_or_else(|| CoreError::ProgressParse(format!("field without value: '{field}'")))?;
            let value = value.trim();
            match key.trim() {
                "position" => record.position = Some(parse_seconds(key, value)?),
                "duration" => record.duration = Some(parse_seconds(key, value)?),
                "remaining" => record.remaining = Some(parse_seconds(key, value)?),
                "WARNING" => record.warning = Some(value.to_string()),
                "result" => record.result = Some(value.to_string()),
                _ => {}
            }
        }
        Ok(LineOutcome::Record(record))
    }

    fn stream(&self) -> OutputStream {
        OutputStream::Stderr
    }

    fn name(&self) -> &'static str {
        "key-value"
    }
}

fn parse_seconds(key: &str, value: &str) -> CoreResult<f64> {
    value
        .parse::<f64>()
        .map_err(|_| CoreError::ProgressParse(format!("{key} is not a number: '{value}'")))
}
