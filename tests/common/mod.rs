//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;

use auth_service::config::ServiceConfig;
use auth_service::http::{build_router, AppState, HttpServer};
use auth_service::lifecycle::Shutdown;
use auth_service::observability::logging::{LogSink, RecordFormat};
use auth_service::{Logger, Metrics};

/// Sink that keeps every line in memory.
#[derive(Clone, Default)]
pub struct MemorySink(Arc<Mutex<Vec<String>>>);

impl MemorySink {
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Lines parsed as structured records.
    pub fn records(&self) -> Vec<Value> {
        self.lines()
            .iter()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        self.0.lock().unwrap().push(line.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Logger writing structured records to a fresh [`MemorySink`].
pub fn memory_logger() -> (Logger, MemorySink) {
    let sink = MemorySink::default();
    let logger = Logger::builder("app")
        .sink(RecordFormat::Structured, sink.clone())
        .build();
    (logger, sink)
}

/// App state without a database.
pub fn test_state() -> (AppState, MemorySink) {
    let (logger, sink) = memory_logger();
    let state = AppState {
        logger,
        metrics: Metrics::new().unwrap(),
        database: None,
    };
    (state, sink)
}

pub fn test_router(state: AppState) -> Router {
    build_router(&ServiceConfig::default(), state)
}

/// Serve the app on an ephemeral local port until `shutdown` fires.
pub async fn start_server(state: AppState, shutdown: &Shutdown) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(ServiceConfig::default(), state);
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

/// Value of an unlabelled sample in a Prometheus text rendering.
pub fn sample(rendered: &str, name: &str) -> Option<f64> {
    let prefix = format!("{name} ");
    rendered
        .lines()
        .find(|line| line.starts_with(&prefix))
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
}
