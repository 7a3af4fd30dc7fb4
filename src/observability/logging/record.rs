//! Log levels and the record handed to every sink.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::Level;

use crate::observability::context::RequestContext;

/// Record keys that extra event fields may not overwrite.
pub const RESERVED_FIELDS: [&str; 6] = [
    "timestamp",
    "level",
    "logger",
    "message",
    "request_id",
    "client_ip",
];

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// Filter directive admitting this level and above.
    ///
    /// tracing has no level above ERROR, so CRITICAL filters like ERROR.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }

    /// Map a tracing level; TRACE folds into DEBUG.
    pub fn from_tracing(level: &Level) -> Self {
        match *level {
            Level::TRACE | Level::DEBUG => LogLevel::Debug,
            Level::INFO => LogLevel::Info,
            Level::WARN => LogLevel::Warning,
            Level::ERROR => LogLevel::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a level name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log level '{0}'")]
pub struct ParseLevelError(pub String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" | "trace" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            "critical" | "fatal" => Ok(LogLevel::Critical),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// One log event, enriched with the request context active when it was emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub logger: String,
    pub message: String,
    pub request_id: String,
    pub client_ip: String,
    /// Extra structured fields attached to the event.
    pub fields: Map<String, Value>,
}

impl LogRecord {
    pub fn new(
        level: LogLevel,
        logger: impl Into<String>,
        message: impl Into<String>,
        context: &RequestContext,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            logger: logger.into(),
            message: message.into(),
            request_id: context.request_id().to_string(),
            client_ip: context.client_ip().to_string(),
            fields: Map::new(),
        }
    }

    /// Attach extra fields. Keys clashing with [`RESERVED_FIELDS`] get an
    /// `extra_` prefix.
    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        for (key, value) in fields {
            let key = if RESERVED_FIELDS.contains(&key.as_str()) {
                format!("extra_{key}")
            } else {
                key
            };
            self.fields.insert(key, value);
        }
        self
    }
}
