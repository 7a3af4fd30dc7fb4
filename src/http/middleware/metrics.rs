//! Request metrics middleware.

use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::http::server::AppState;
use crate::observability::metrics::UNMATCHED_PATH;

/// Count and time every request, labelled by its route template.
///
/// The in-flight guard lives on this future's stack, so a request that is
/// cancelled mid-flight is still released.
pub async fn track_metrics(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_PATH.to_owned());
    let method = req.method().to_string();

    let _in_flight = state.metrics.track_in_flight();
    let start = Instant::now();
    let response = next.run(req).await;

    state
        .metrics
        .record_request(&method, &path, response.status().as_u16(), start.elapsed());
    response
}
