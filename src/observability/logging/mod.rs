//! Structured, request-scoped logging.
//!
//! # Data Flow
//! ```text
//! Logger::log / tracing::info!(...)
//!     → Dispatch owned by the Logger (EnvFilter, default INFO)
//!     → layer.rs (one LogRecord per event, enriched from context.rs)
//!     → format.rs (Structured JSON | Console colored text)
//!     → sinks: rotation.rs (logs/app.log) + sink.rs (stdout)
//! ```
//!
//! # Design Decisions
//! - The Logger is an explicit handle passed to its consumers; installing it
//!   as the process-wide tracing dispatcher happens exactly once
//! - Sink failures are swallowed so logging never fails a request
//! - CRITICAL is carried as an ERROR event with `severity = "CRITICAL"`

mod format;
mod layer;
mod record;
mod rotation;
mod sink;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::dispatcher::{self, Dispatch, SetGlobalDefaultError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub use format::{console, structured, RecordFormat};
pub use layer::RecordLayer;
pub use record::{LogLevel, LogRecord, ParseLevelError, RESERVED_FIELDS};
pub use rotation::RotatingFile;
pub use sink::{ConsoleSink, LogSink};

/// Target of events emitted through [`Logger::log`].
pub const LOG_TARGET: &str = "auth_service";

static GLOBAL: OnceCell<Logger> = OnceCell::new();

/// Errors raised while building or installing a logger.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {}: {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Level(#[from] ParseLevelError),

    #[error("failed to install the global logger: {0}")]
    Install(#[from] SetGlobalDefaultError),
}

/// Named, leveled logger writing every record to all of its sinks.
///
/// Cloning is cheap; clones share the same sinks.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

struct LoggerInner {
    name: String,
    sink_count: usize,
    dispatch: Dispatch,
}

impl Logger {
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder {
            name: name.into(),
            level: LogLevel::Info,
            filter: None,
            sinks: Vec::new(),
        }
    }

    /// Build the service logger: JSON lines to a rotating file under
    /// `config.directory` and colored lines to stdout.
    ///
    /// `RUST_LOG`, when set, replaces the configured level.
    pub fn from_config(config: &LoggingConfig) -> Result<Self, LoggingError> {
        let level: LogLevel = config.level.parse()?;

        let directory = PathBuf::from(&config.directory);
        fs::create_dir_all(&directory).map_err(|source| LoggingError::Directory {
            path: directory.clone(),
            source,
        })?;

        let file = RotatingFile::new(
            directory.join(&config.file_name),
            config.max_file_bytes,
            config.max_backups,
        );
        let mut builder = Self::builder(config.name.clone()).level(level);
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            builder = builder.env_filter(filter);
        }

        Ok(builder
            .sink(RecordFormat::Structured, file)
            .sink(
                RecordFormat::Console {
                    ansi: config.console_colors,
                },
                ConsoleSink,
            )
            .build())
    }

    /// Process-wide logger, built and installed on first use.
    ///
    /// Concurrent first callers block until one of them has finished; every
    /// caller gets the same instance and later configs are ignored.
    pub fn init(config: &LoggingConfig) -> Result<&'static Logger, LoggingError> {
        GLOBAL.get_or_try_init(|| {
            let logger = Self::from_config(config)?;
            logger.install_global()?;
            Ok(logger)
        })
    }

    /// The process-wide logger, if [`Logger::init`] has succeeded.
    pub fn global() -> Option<&'static Logger> {
        GLOBAL.get()
    }

    /// Route every `tracing` event in the process through this logger.
    pub fn install_global(&self) -> Result<(), LoggingError> {
        dispatcher::set_global_default(self.inner.dispatch.clone())?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn sink_count(&self) -> usize {
        self.inner.sink_count
    }

    /// The dispatcher behind this logger, for attaching it to futures with
    /// `tracing::instrument::WithSubscriber`.
    pub fn dispatch(&self) -> &Dispatch {
        &self.inner.dispatch
    }

    /// Emit `message` at `level` to every sink, synchronously.
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        let message = message.as_ref();
        dispatcher::with_default(&self.inner.dispatch, || match level {
            LogLevel::Debug => tracing::debug!(target: LOG_TARGET, "{message}"),
            LogLevel::Info => tracing::info!(target: LOG_TARGET, "{message}"),
            LogLevel::Warning => tracing::warn!(target: LOG_TARGET, "{message}"),
            LogLevel::Error => tracing::error!(target: LOG_TARGET, "{message}"),
            LogLevel::Critical => {
                tracing::error!(target: LOG_TARGET, severity = "CRITICAL", "{message}")
            }
        });
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    pub fn critical(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Critical, message);
    }

    /// Run `f` with this logger as the thread's default dispatcher, so plain
    /// `tracing` macros inside it reach this logger's sinks.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        dispatcher::with_default(&self.inner.dispatch, f)
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.inner.name)
            .field("sink_count", &self.inner.sink_count)
            .finish()
    }
}

/// Builder for [`Logger`].
pub struct LoggerBuilder {
    name: String,
    level: LogLevel,
    filter: Option<EnvFilter>,
    sinks: Vec<(RecordFormat, Arc<dyn LogSink>)>,
}

impl LoggerBuilder {
    /// Minimum level; defaults to INFO.
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Use a full filter instead of a single minimum level; the configured
    /// level is then ignored.
    pub fn env_filter(mut self, filter: EnvFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sink(mut self, format: RecordFormat, sink: impl LogSink + 'static) -> Self {
        let sink: Arc<dyn LogSink> = Arc::new(sink);
        self.sinks.push((format, sink));
        self
    }

    pub fn build(self) -> Logger {
        let mut layer = RecordLayer::new(&self.name, self.sinks);
        let filter = match self.filter {
            Some(filter) => filter,
            None => {
                // The directive cannot express CRITICAL; the layer enforces it.
                layer = layer.with_min_level(self.level);
                EnvFilter::new(self.level.directive())
            }
        };
        let sink_count = layer.sink_count();

        let subscriber = tracing_subscriber::registry().with(filter).with(layer);

        Logger {
            inner: Arc::new(LoggerInner {
                name: self.name,
                sink_count,
                dispatch: Dispatch::new(subscriber),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::context::{self, RequestContext};
    use serde_json::Value;
    use std::io;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct MemorySink(Arc<Mutex<Vec<String>>>);

    impl MemorySink {
        fn records(&self) -> Vec<Value> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    impl LogSink for MemorySink {
        fn write_line(&self, line: &str) -> io::Result<()> {
            self.0.lock().unwrap().push(line.to_string());
            Ok(())
        }

        fn name(&self) -> &str {
            "memory"
        }
    }

    struct BrokenSink;

    impl LogSink for BrokenSink {
        fn write_line(&self, _line: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn memory_logger(level: LogLevel) -> (Logger, MemorySink) {
        let sink = MemorySink::default();
        let logger = Logger::builder("app")
            .level(level)
            .sink(RecordFormat::Structured, sink.clone())
            .build();
        (logger, sink)
    }

    #[test]
    fn test_default_level_filters_debug() {
        let (logger, sink) = memory_logger(LogLevel::Info);
        logger.debug("hidden");
        logger.info("shown");

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["message"], "shown");
        assert_eq!(records[0]["logger"], "app");
    }

    #[test]
    fn test_critical_level() {
        let (logger, sink) = memory_logger(LogLevel::Info);
        logger.critical("disk full");

        let records = sink.records();
        assert_eq!(records[0]["level"], "CRITICAL");
        assert!(records[0].get("severity").is_none());
    }

    #[test]
    fn test_critical_level_drops_plain_errors() {
        let (logger, sink) = memory_logger(LogLevel::Critical);
        logger.warning("ignored");
        logger.error("also ignored");
        tracing::dispatcher::with_default(logger.dispatch(), || {
            tracing::error!("plain tracing error");
        });
        logger.critical("kept");

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["level"], "CRITICAL");
        assert_eq!(records[0]["message"], "kept");
    }

    #[test]
    fn test_records_carry_bound_context() {
        let (logger, sink) = memory_logger(LogLevel::Info);
        let ctx = RequestContext::new(Some("req-7".into()), Some("127.0.0.1".into()));
        context::sync_scope(ctx, || logger.warning("slow query"));
        logger.info("outside");

        let records = sink.records();
        assert_eq!(records[0]["request_id"], "req-7");
        assert_eq!(records[0]["client_ip"], "127.0.0.1");
        assert_eq!(records[0]["level"], "WARNING");
        assert_eq!(records[1]["client_ip"], "unknown");
        assert_ne!(records[1]["request_id"], "req-7");
    }

    #[test]
    fn test_every_sink_gets_the_same_record() {
        let first = MemorySink::default();
        let second = MemorySink::default();
        let logger = Logger::builder("app")
            .sink(RecordFormat::Structured, first.clone())
            .sink(RecordFormat::Structured, second.clone())
            .build();

        logger.info("fan out");

        assert_eq!(logger.sink_count(), 2);
        assert_eq!(first.records(), second.records());
    }

    #[test]
    fn test_broken_sink_does_not_stop_others() {
        let sink = MemorySink::default();
        let logger = Logger::builder("app")
            .sink(RecordFormat::Structured, BrokenSink)
            .sink(RecordFormat::Structured, sink.clone())
            .build();

        logger.error("first");
        logger.error("second");

        assert_eq!(sink.records().len(), 2);
    }

    #[test]
    fn test_in_scope_routes_tracing_macros() {
        let (logger, sink) = memory_logger(LogLevel::Info);
        logger.in_scope(|| tracing::info!(attempt = 2, "Connecting to the database"));

        let records = sink.records();
        assert_eq!(records[0]["message"], "Connecting to the database");
        assert_eq!(records[0]["attempt"], 2);
    }

    #[test]
    fn test_from_config_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            directory: dir.path().join("logs").to_string_lossy().into_owned(),
            console_colors: false,
            ..LoggingConfig::default()
        };

        let logger = Logger::from_config(&config).unwrap();
        assert_eq!(logger.sink_count(), 2);
        assert_eq!(logger.name(), "app");
        assert!(dir.path().join("logs").is_dir());
    }

    #[test]
    fn test_from_config_rejects_unknown_level() {
        let config = LoggingConfig {
            level: "chatty".into(),
            ..LoggingConfig::default()
        };
        assert!(matches!(
            Logger::from_config(&config),
            Err(LoggingError::Level(_))
        ));
    }
}
