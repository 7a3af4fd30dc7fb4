//! Database connectivity.
//!
//! # Design Decisions
//! - Connecting goes through the [`Connector`] trait so startup retry logic
//!   does not depend on a live Postgres
//! - The pool is created once at startup and shared through `AppState`

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;

/// Something that can open a database connection.
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: Send;
    type Error: fmt::Display + Send;

    async fn connect(&self) -> Result<Self::Connection, Self::Error>;
}

/// Opens a Postgres connection pool.
pub struct PgConnector {
    url: String,
    max_connections: u32,
    acquire_timeout: Duration,
}

impl PgConnector {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            acquire_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }
}

impl fmt::Debug for PgConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConnector")
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Connection = PgPool;
    type Error = sqlx::Error;

    async fn connect(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect(&self.url)
            .await
    }
}
