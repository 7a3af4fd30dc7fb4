//! tracing layer that turns events into [`LogRecord`]s and fans them out.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use super::format::RecordFormat;
use super::record::{LogLevel, LogRecord};
use super::sink::LogSink;
use crate::observability::context;

/// Field name that raises an ERROR event to CRITICAL.
pub(crate) const SEVERITY_FIELD: &str = "severity";

/// A sink together with the format it expects.
struct SinkEntry {
    format: RecordFormat,
    sink: Arc<dyn LogSink>,
    failed: AtomicBool,
}

impl SinkEntry {
    fn write(&self, record: &LogRecord) {
        let line = self.format.render(record);
        if let Err(err) = self.sink.write_line(&line) {
            // Logging must never fail the caller. Report once per failure streak.
            if !self.failed.swap(true, Ordering::Relaxed) {
                eprintln!(
                    "log sink '{}' failed, dropping its output: {err}",
                    self.sink.name()
                );
            }
        } else if self.failed.load(Ordering::Relaxed) {
            self.failed.store(false, Ordering::Relaxed);
        }
    }
}

/// Builds one record per event and writes it to every sink.
pub struct RecordLayer {
    logger: Arc<str>,
    min_level: Option<LogLevel>,
    sinks: Vec<SinkEntry>,
}

impl RecordLayer {
    pub fn new(logger: &str, sinks: Vec<(RecordFormat, Arc<dyn LogSink>)>) -> Self {
        Self {
            logger: Arc::from(logger),
            min_level: None,
            sinks: sinks
                .into_iter()
                .map(|(format, sink)| SinkEntry {
                    format,
                    sink,
                    failed: AtomicBool::new(false),
                })
                .collect(),
        }
    }

    /// Drop records below `level`, judged after CRITICAL has been lifted
    /// from the severity field.
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = Some(level);
        self
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

impl<S> Layer<S> for RecordLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let level = visitor
            .severity
            .unwrap_or_else(|| LogLevel::from_tracing(event.metadata().level()));
        if self.min_level.is_some_and(|min| level < min) {
            return;
        }
        let context = context::current().unwrap_or_default();

        let record = LogRecord::new(
            level,
            self.logger.as_ref(),
            visitor.message.unwrap_or_default(),
            &context,
        )
        .with_fields(visitor.fields);

        for sink in &self.sinks {
            sink.write(&record);
        }
    }
}

/// Collects the message, an optional severity override and the remaining
/// fields of an event.
#[derive(Default)]
struct RecordVisitor {
    message: Option<String>,
    severity: Option<LogLevel>,
    fields: Map<String, Value>,
}

impl RecordVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for RecordVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{value:?}");
        match field.name() {
            "message" => self.message = Some(rendered),
            SEVERITY_FIELD => self.severity = rendered.trim_matches('"').parse().ok(),
            _ => self.insert(field, Value::String(rendered)),
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            SEVERITY_FIELD => self.severity = value.parse().ok(),
            _ => self.insert(field, Value::String(value.to_string())),
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let Some(n) = serde_json::Number::from_f64(value) {
            self.insert(field, Value::Number(n));
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::String(value.to_string()));
    }
}
