// ============================================================================
// theoraq-core/src/progress/mod.rs
// ============================================================================
//
// PROGRESS: Encoder Progress Grammars and Status Text
//
// The encoder reports progress in frontend mode using one of two line
// grammars, depending on its version. Both are parsed into the same
// ProgressRecord, which is merged into a running ProgressInfo and turned into
// a human-readable status by the StatusTracker.
//
// KEY COMPONENTS:
// - ProgressRecord / ProgressInfo: unified event type and its accumulation
// - LineParser: grammar seam, implemented by KeyValueParser and JsonRecordParser
// - ProgressFormat: configuration/probing choice of grammar
// - StatusTracker, timestr: status text computation

mod json;
mod key_value;
mod status;

pub use json::JsonRecordParser;
pub use key_value::KeyValueParser;
pub use status::{STATUS_ENCODING, StatusTracker, timestr};

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CoreResult;

/// One progress report from the encoder. Every field is optional; absent
/// fields leave the running info untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressRecord {
    /// Seconds of input encoded so far
    pub position: Option<f64>,
    /// Total input duration in seconds, zero when unknown
    pub duration: Option<f64>,
    /// Estimated seconds left
    pub remaining: Option<f64>,
    pub warning: Option<String>,
    /// `"ok"` on success, otherwise a failure description
    pub result: Option<String>,
}

impl ProgressRecord {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Accumulated state of a running encode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressInfo {
    pub position: Option<f64>,
    pub duration: Option<f64>,
    pub remaining: Option<f64>,
    pub warning: Option<String>,
    pub result: Option<String>,
}

impl ProgressInfo {
    /// Overwrites the fields present in `record`.
    pub fn merge(&mut self, record: ProgressRecord) {
        if record.position.is_some() {
            self.position = record.position;
        }
        if record.duration.is_some() {
            self.duration = record.duration;
        }
        if record.remaining.is_some() {
            self.remaining = record.remaining;
        }
        if record.warning.is_some() {
            self.warning = record.warning;
        }
        if record.result.is_some() {
            self.result = record.result;
        }
    }

    pub fn succeeded(&self) -> bool {
        self.result.as_deref() == Some("ok")
    }
}

/// Which stream of the encoder carries the progress lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Result of feeding one line to a parser.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Record(ProgressRecord),
    /// Console chatter that is not part of the grammar
    Noise,
}

/// A progress line grammar.
pub trait LineParser: Send + Sync {
    /// Parses one line. Malformed records are errors; lines outside the
    /// grammar are [`LineOutcome::Noise`].
    fn parse_line(&self, line: &str) -> CoreResult<LineOutcome>;

    /// Stream the encoder writes this grammar to.
    fn stream(&self) -> OutputStream;

    fn name(&self) -> &'static str;
}

/// Grammar selection, either explicit or decided by probing the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressFormat {
    #[default]
    Auto,
    KeyValue,
    Json,
}

impl ProgressFormat {
    /// Builds the parser for a concrete format. `Auto` falls back to JSON,
    /// the grammar of current encoder releases.
    pub fn parser(self) -> Box<dyn LineParser> {
        match self {
            Self::KeyValue => Box::new(KeyValueParser),
            Self::Json | Self::Auto => Box::new(JsonRecordParser),
        }
    }
}

impl fmt::Display for ProgressFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auto => "auto",
            Self::KeyValue => "key-value",
            Self::Json => "json",
        };
        f.write_str(name)
    }
}

impl FromStr for ProgressFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "key-value" | "keyvalue" | "f2t" => Ok(Self::KeyValue),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown progress format '{other}'")),
        }
    }
}
