//! The two renderings of a [`LogRecord`].
//!
//! - Structured: single-line JSON for the file sink and log aggregation
//! - Console: level-colored text for humans
//!
//! Both are pure functions of the record.

use std::fmt::Write as _;

use chrono::SecondsFormat;
use colored::Colorize;
use serde::Serialize;
use serde_json::{Map, Value};

use super::record::{LogLevel, LogRecord};

/// How a sink renders records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// One JSON object per line.
    Structured,
    /// `LEVEL timestamp logger message [request_id client_ip]`.
    Console {
        /// Wrap the line in ANSI color codes.
        ansi: bool,
    },
}

impl RecordFormat {
    pub fn render(self, record: &LogRecord) -> String {
        match self {
            RecordFormat::Structured => structured(record),
            RecordFormat::Console { ansi } => console(record, ansi),
        }
    }
}

#[derive(Serialize)]
struct StructuredLine<'a> {
    timestamp: String,
    level: LogLevel,
    logger: &'a str,
    message: &'a str,
    request_id: &'a str,
    client_ip: &'a str,
    #[serde(flatten)]
    fields: &'a Map<String, Value>,
}

/// Render a record as a single-line JSON object.
pub fn structured(record: &LogRecord) -> String {
    let line = StructuredLine {
        timestamp: record
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        level: record.level,
        logger: &record.logger,
        message: &record.message,
        request_id: &record.request_id,
        client_ip: &record.client_ip,
        fields: &record.fields,
    };

    serde_json::to_string(&line).unwrap_or_else(|err| {
        serde_json::json!({
            "level": record.level,
            "logger": record.logger,
            "message": format!("unserializable log record: {err}"),
            "request_id": record.request_id,
            "client_ip": record.client_ip,
        })
        .to_string()
    })
}

/// Render a record as a human-readable line, colored by level when `ansi` is set.
pub fn console(record: &LogRecord, ansi: bool) -> String {
    let mut line = format!(
        "{} {} {} {}",
        record.level,
        record.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        record.logger,
        record.message,
    );
    for (key, value) in &record.fields {
        match value {
            Value::String(s) => {
                let _ = write!(line, " {key}={s}");
            }
            other => {
                let _ = write!(line, " {key}={other}");
            }
        }
    }
    let _ = write!(line, " [{} {}]", record.request_id, record.client_ip);

    if ansi {
        colorize(record.level, &line)
    } else {
        line
    }
}

fn colorize(level: LogLevel, line: &str) -> String {
    match level {
        LogLevel::Debug => line.cyan(),
        LogLevel::Info => line.green(),
        LogLevel::Warning => line.yellow(),
        LogLevel::Error => line.red(),
        LogLevel::Critical => line.red().bold(),
    }
    .to_string()
}
