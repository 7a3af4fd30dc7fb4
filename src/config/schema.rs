//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Root configuration for the auth service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Database connection and bootstrap retry settings.
    pub database: DatabaseConfig,

    /// Logger name, level and sink settings.
    pub logging: LoggingConfig,

    /// Metrics exposition settings.
    pub metrics: MetricsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Database configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Postgres connection string. Usually supplied through `DATABASE_URL`.
    pub url: String,

    /// Connection attempts made at startup before giving up.
    pub max_retries: u32,

    /// Fixed delay between connection attempts, in seconds.
    pub retry_delay_secs: u64,

    /// Maximum pooled connections.
    pub max_connections: u32,

    /// Timeout for acquiring a connection, in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_retries: 3,
            retry_delay_secs: 2,
            max_connections: 5,
            connect_timeout_secs: 5,
        }
    }
}

// The connection string may carry credentials.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &if self.url.is_empty() { "<unset>" } else { "<redacted>" })
            .field("max_retries", &self.max_retries)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logger name stamped on every record.
    pub name: String,

    /// Minimum level: debug, info, warning, error or critical.
    pub level: String,

    /// Directory holding the log file, relative to the working directory.
    pub directory: String,

    /// Active log file name inside `directory`.
    pub file_name: String,

    /// Size cap of one log file segment in bytes.
    pub max_file_bytes: u64,

    /// Number of rotated segments kept next to the active one.
    pub max_backups: usize,

    /// Emit ANSI colors on the console sink.
    pub console_colors: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            name: "app".to_string(),
            level: "info".to_string(),
            directory: "logs".to_string(),
            file_name: "app.log".to_string(),
            max_file_bytes: 10 * 1024 * 1024,
            max_backups: 5,
            console_colors: true,
        }
    }
}

/// Metrics exposition configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve the Prometheus endpoint.
    pub enabled: bool,

    /// Address of the exposition endpoint.
    pub bind_address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}
