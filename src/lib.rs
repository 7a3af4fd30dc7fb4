//! OpsFlow auth service library.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
pub use observability::{Logger, Metrics};
