//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Startup connection to Postgres:
//!     → retries.rs (fixed attempts, fixed delay, logged)
//!     → exhausted: ApiError(500, "Database connection error")
//! ```

pub mod retries;

pub use retries::{connect_with_retry, RetryPolicy};
