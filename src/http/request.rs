//! Per-request context binding.
//!
//! # Responsibilities
//! - Read the request ID set by the request-id layer
//! - Resolve the client IP from the connection
//! - Bind both to the request task for the duration of the request
//!
//! # Design Decisions
//! - Runs after `SetRequestIdLayer`, so an ID is always present; a missing
//!   or non-UTF-8 header still gets a fresh UUID
//! - The context is also inserted as a request extension so handlers can
//!   extract it directly

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderName, Request},
    middleware::Next,
    response::Response,
};

use crate::observability::context::{self, RequestContext};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Build the [`RequestContext`] for a request.
pub fn context_from_request<B>(req: &Request<B>) -> RequestContext {
    let request_id = req
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned);
    let client_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    RequestContext::new(request_id, client_ip)
}

/// Middleware binding the request context for everything downstream.
pub async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    let ctx = context_from_request(&req);
    req.extensions_mut().insert(ctx.clone());
    context::scope(ctx, next.run(req)).await
}
