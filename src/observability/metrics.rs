//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, route, status
//! - `http_request_latency_seconds` (histogram): latency by method, route
//! - `http_requests_in_progress` (gauge): requests currently in flight
//!
//! # Design Decisions
//! - The Prometheus recorder is owned by [`Metrics`] instead of being
//!   installed globally, so the registry is injected like the logger
//! - The in-flight gauge is held by a guard; dropping it is the only way to
//!   decrement, which covers errors, panics and cancelled requests
//! - Exposition is pull only: `GET /metrics` on its own listener
//! - Histogram upkeep runs whether or not exposition is enabled, and stops
//!   on the shutdown broadcast

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::header, response::IntoResponse, routing::get, Router};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_LATENCY: &str = "http_request_latency_seconds";
pub const REQUESTS_IN_PROGRESS: &str = "http_requests_in_progress";

/// Path label for requests that matched no route.
pub const UNMATCHED_PATH: &str = "unmatched";

/// Latency buckets in seconds.
const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Content type of the Prometheus text format.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Request metrics backed by a Prometheus recorder.
#[derive(Clone)]
pub struct Metrics {
    recorder: Arc<PrometheusRecorder>,
    handle: PrometheusHandle,
}

impl Metrics {
    pub fn new() -> Result<Self, BuildError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Full(REQUEST_LATENCY.to_string()), LATENCY_BUCKETS)?
            .build_recorder();
        let handle = recorder.handle();

        let metrics = Self {
            recorder: Arc::new(recorder),
            handle,
        };
        metrics.with_recorder(|| {
            describe_counter!(REQUESTS_TOTAL, "Total HTTP requests");
            describe_histogram!(REQUEST_LATENCY, Unit::Seconds, "Request latency");
            describe_gauge!(REQUESTS_IN_PROGRESS, "In-progress HTTP requests");
            gauge!(REQUESTS_IN_PROGRESS).set(0.0);
        });

        Ok(metrics)
    }

    fn with_recorder<T>(&self, f: impl FnOnce() -> T) -> T {
        metrics::with_local_recorder(self.recorder.as_ref(), f)
    }

    /// Record a finished request.
    pub fn record_request(&self, method: &str, path: &str, status: u16, elapsed: Duration) {
        let method = method.to_string();
        let path = path.to_string();
        self.with_recorder(|| {
            counter!(
                REQUESTS_TOTAL,
                "method" => method.clone(),
                "path" => path.clone(),
                "status" => status.to_string()
            )
            .increment(1);
            histogram!(REQUEST_LATENCY, "method" => method, "path" => path)
                .record(elapsed.as_secs_f64());
        });
    }

    /// Count a request as in flight until the returned guard is dropped.
    pub fn track_in_flight(&self) -> InFlightGuard {
        self.with_recorder(|| gauge!(REQUESTS_IN_PROGRESS).increment(1.0));
        InFlightGuard {
            metrics: self.clone(),
        }
    }

    /// Current values in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Drain histogram buffers into their buckets.
    pub fn run_upkeep(&self) {
        self.handle.run_upkeep();
    }

    /// Run [`Metrics::run_upkeep`] periodically until `shutdown` fires or
    /// its sender is dropped.
    pub fn spawn_upkeep(&self, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let metrics = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(UPKEEP_INTERVAL);
            loop {
                tokio::select! {
                    _ = interval.tick() => metrics.run_upkeep(),
                    _ = shutdown.recv() => break,
                }
            }
            tracing::debug!("Metrics upkeep stopped");
        })
    }
}

/// Decrements the in-flight gauge when dropped.
#[must_use = "the request stops being counted as in flight when the guard is dropped"]
pub struct InFlightGuard {
    metrics: Metrics,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.metrics
            .with_recorder(|| gauge!(REQUESTS_IN_PROGRESS).decrement(1.0));
    }
}

/// Router serving `GET /metrics`.
pub fn exporter_router(metrics: Metrics) -> Router {
    Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(metrics)
}

async fn render_metrics(State(metrics): State<Metrics>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        metrics.render(),
    )
}

/// Bind the exposition endpoint and serve it for the rest of the process.
pub async fn start_exporter(addr: SocketAddr, metrics: Metrics) -> std::io::Result<JoinHandle<()>> {
    let listener = TcpListener::bind(addr).await?;
    Ok(spawn_exporter(listener, metrics))
}

/// Serve the exposition endpoint on an already bound listener.
pub fn spawn_exporter(listener: TcpListener, metrics: Metrics) -> JoinHandle<()> {
    let addr = listener.local_addr().ok();
    tokio::spawn(async move {
        tracing::info!(address = ?addr, "Prometheus metrics exporter started");
        if let Err(e) = axum::serve(listener, exporter_router(metrics)).await {
            tracing::error!(error = %e, "Metrics exporter stopped");
        }
    })
}
