//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, context, timeout, metrics, errors)
//! - Bind server to listener
//! - Stop on the shutdown broadcast
//!
//! # Middleware order (outermost first)
//! ```text
//! SetRequestId → Trace → PropagateRequestId
//!     → track_metrics → Timeout → request_context → error_boundary → handler
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::http::handlers;
use crate::http::middleware::{error_boundary, track_metrics};
use crate::http::request::{request_context, X_REQUEST_ID};
use crate::observability::{Logger, Metrics};

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub logger: Logger,
    pub metrics: Metrics,
    /// `None` runs the service without a database.
    pub database: Option<PgPool>,
}

/// HTTP server for the auth service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig, state: AppState) -> Self {
        let router = build_router(&config, state);
        Self { router, config }
    }

    /// Run the server until a shutdown is broadcast.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &ServiceConfig, state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), error_boundary))
        .layer(middleware::from_fn(request_context))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(middleware::from_fn_with_state(state.clone(), track_metrics))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                // Failures are logged by error_boundary, inside the request context.
                .layer(TraceLayer::new_for_http().on_failure(()))
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
        )
}
