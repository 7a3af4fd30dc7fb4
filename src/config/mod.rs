//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → .env / environment overrides (DATABASE_URL, LOG_LEVEL, ...)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → handed to the composition root in main.rs
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so only `DATABASE_URL` is mandatory
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    DatabaseConfig, ListenerConfig, LoggingConfig, MetricsConfig, ServiceConfig, TimeoutConfig,
};
pub use validation::ValidationError;
