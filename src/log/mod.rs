use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod batch;
pub mod decoder;
pub mod fetch;
pub mod reader;

pub use batch::BatchingSink;
pub use decoder::Utf8StreamDecoder;
pub use fetch::{LogFetcher, LogSource};
pub use reader::ChunkedStreamReader;

/// Field inside a JSON log line carrying the event time in epoch milliseconds
pub const TIME_FIELD: &str = "_time";

/// Largest absolute epoch-millisecond value accepted as a timestamp (±100,000,000 days)
const MAX_EPOCH_MILLIS: f64 = 8.64e15;

/// A single parsed log line.
///
/// `event` is always the raw line exactly as it arrived. `time` is an
/// ISO-8601 UTC timestamp with millisecond precision, taken from the
/// `_time` field when the line is JSON and falling back to the ingestion
/// wall-clock time otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    time: String,
    event: String,
}

impl LogRecord {
    /// Build a record from an already formatted timestamp (tests, replay)
    pub fn new(time: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            event: event.into(),
        }
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    /// Date portion of the timestamp (YYYY-MM-DD), used for day bucketing
    pub fn day(&self) -> &str {
        self.time.get(..10).unwrap_or(&self.time)
    }
}

/// Parse one raw line into a record. Never fails.
pub fn parse(line: &str) -> LogRecord {
    parse_at(line, Utc::now())
}

/// Parse with an explicit fallback clock, so callers can stamp a whole batch
/// with one ingestion time.
pub fn parse_at(line: &str, now: DateTime<Utc>) -> LogRecord {
    let time = event_time(line).unwrap_or(now);
    LogRecord {
        time: format_time(&time),
        event: line.to_string(),
    }
}

/// Format a timestamp the way records carry it: `2024-08-22T10:46:16.596Z`
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn event_time(line: &str) -> Option<DateTime<Utc>> {
    let json: Value = serde_json::from_str(line).ok()?;
    match json.get(TIME_FIELD)? {
        Value::Number(n) => from_epoch_millis(n.as_f64()?),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        _ => None,
    }
}

fn from_epoch_millis(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() || millis.abs() > MAX_EPOCH_MILLIS {
        return None;
    }
    DateTime::from_timestamp_millis(millis.trunc() as i64)
}

/// Pretty-print an event as 2-space indented JSON.
/// Non-JSON events are returned verbatim.
pub fn pretty_event(event: &str) -> String {
    serde_json::from_str::<Value>(event)
        .ok()
        .and_then(|json| serde_json::to_string_pretty(&json).ok())
        .unwrap_or_else(|| event.to_string())
}

/// Number of lines the pretty-printed form of an event occupies
pub fn json_line_count(event: &str) -> usize {
    pretty_event(event).split('\n').count()
}
