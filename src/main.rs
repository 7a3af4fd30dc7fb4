//! OpsFlow auth service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ metrics ─▶ timeout ─▶ context ─▶ error boundary ─▶ handler
//!                                      │                     │             │
//!                                      ▼                     ▼             ▼
//!                              Prometheus :9090      task-local ctx     Logger
//!                                                                   (logs/app.log + stdout)
//! ```
//!
//! # Startup order
//! 1. Configuration (file, `.env`, environment)
//! 2. Logger (installed as the global tracing dispatcher)
//! 3. Metrics registry and exporter
//! 4. Database pool, with retries
//! 5. HTTP listener

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use auth_service::config::load_config;
use auth_service::db::PgConnector;
use auth_service::lifecycle::{spawn_signal_handler, Shutdown};
use auth_service::observability::metrics::start_exporter;
use auth_service::resilience::{connect_with_retry, RetryPolicy};
use auth_service::{AppState, HttpServer, Logger, Metrics};

#[derive(Parser)]
#[command(name = "auth-service")]
#[command(about = "OpsFlow authentication service", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults and environment variables apply without one
    #[arg(short, long, env = "AUTH_SERVICE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let logger = Logger::init(&config.logging)?.clone();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "auth-service starting"
    );

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let metrics = Metrics::new()?;
    let upkeep = metrics.spawn_upkeep(shutdown.subscribe());
    if config.metrics.enabled {
        let addr: SocketAddr = config.metrics.bind_address.parse()?;
        start_exporter(addr, metrics.clone()).await?;
    }

    let connector = PgConnector::new(&config.database);
    let pool = match connect_with_retry(&connector, &RetryPolicy::from(&config.database)).await {
        Ok(pool) => pool,
        Err(e) => {
            logger.critical(format!("Startup aborted: {e}"));
            return Err(e.into());
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let state = AppState {
        logger,
        metrics,
        database: Some(pool.clone()),
    };
    let server = HttpServer::new(config, state);
    server.run(listener, shutdown.subscribe()).await?;

    shutdown.trigger();
    let _ = upkeep.await;
    pool.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
