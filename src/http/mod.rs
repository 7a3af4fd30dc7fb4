//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout)
//!     → middleware/metrics.rs (in-flight gauge, counters, latency)
//!     → request.rs (bind request_id + client_ip to the task)
//!     → middleware/error_boundary.rs (log ApiError responses)
//!     → handlers.rs
//!     → response.rs (ApiError → JSON envelope)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{ApiErrorReport, ErrorResponse};
pub use server::{build_router, AppState, HttpServer};
