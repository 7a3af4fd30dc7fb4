//! Request middleware installed on every route.

pub mod error_boundary;
pub mod metrics;

pub use error_boundary::error_boundary;
pub use metrics::track_metrics;
