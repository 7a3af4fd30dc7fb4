//! Retry logic.
//!
//! # Responsibilities
//! - Connect to infrastructure with a bounded number of attempts
//! - Wait a fixed delay between attempts
//! - Convert exhaustion into an `ApiError` carrying the last failure
//!
//! # Design Decisions
//! - No delay after the final attempt
//! - Every attempt, failure and the exhaustion are logged

use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::db::Connector;
use crate::error::ApiError;

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl From<&DatabaseConfig> for RetryPolicy {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_attempts: config.max_retries,
            delay: Duration::from_secs(config.retry_delay_secs),
        }
    }
}

/// Connect through `connector`, retrying per `policy`.
pub async fn connect_with_retry<C>(connector: &C, policy: &RetryPolicy) -> Result<C::Connection, ApiError>
where
    C: Connector + ?Sized,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        tracing::info!("Connecting to the database, attempt {attempt}");
        match connector.connect().await {
            Ok(connection) => {
                tracing::info!("Database connection successful");
                return Ok(connection);
            }
            Err(e) => {
                last_error = e.to_string();
                tracing::warn!("Database connection attempt {attempt} failed: {last_error}");
                if attempt < max_attempts {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }

    tracing::error!("All database connection attempts failed");
    Err(ApiError::new("Database connection error").with_detail("error", last_error))
}
