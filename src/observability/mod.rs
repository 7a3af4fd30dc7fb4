//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! request_context middleware
//!     → context.rs (request_id + client_ip bound to the request task)
//!
//! Handlers, middleware, startup code produce:
//!     → logging/ (records enriched from context.rs, fanned out to sinks)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → logs/app.log (JSON lines, rotated by size)
//!     → stdout (colored text)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log record without being passed around
//! - Context is task-local: concurrent requests never see each other's values
//! - Logger and Metrics are handles injected into the HTTP state

pub mod context;
pub mod logging;
pub mod metrics;

pub use context::RequestContext;
pub use logging::{LogLevel, Logger, LoggingError};
pub use metrics::Metrics;
