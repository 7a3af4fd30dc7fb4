//! Request-scoped context (request ID, client IP).
//!
//! The context is bound to one request's task with a tokio task-local. It is
//! visible to everything polled inside [`scope`] and disappears when that
//! future completes or is dropped, so there is nothing to clear on exit.
//! Tasks spawned from inside a scope do not inherit it.

use std::future::Future;

use uuid::Uuid;

/// Client IP reported when the peer address is unknown.
pub const UNKNOWN_CLIENT_IP: &str = "unknown";

tokio::task_local! {
    static REQUEST_CONTEXT: RequestContext;
}

/// Identifiers of the request currently being processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    request_id: String,
    client_ip: String,
}

impl RequestContext {
    /// Build a context, filling in a fresh UUID and `"unknown"` for absent values.
    pub fn new(request_id: Option<String>, client_ip: Option<String>) -> Self {
        Self {
            request_id: request_id.unwrap_or_else(new_request_id),
            client_ip: client_ip.unwrap_or_else(|| UNKNOWN_CLIENT_IP.to_string()),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn client_ip(&self) -> &str {
        &self.client_ip
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Run `fut` with `context` bound for its whole execution.
pub async fn scope<F>(context: RequestContext, fut: F) -> F::Output
where
    F: Future,
{
    REQUEST_CONTEXT.scope(context, fut).await
}

/// Run `f` synchronously with `context` bound.
pub fn sync_scope<R>(context: RequestContext, f: impl FnOnce() -> R) -> R {
    REQUEST_CONTEXT.sync_scope(context, f)
}

/// The context bound to the calling task, if any.
pub fn current() -> Option<RequestContext> {
    REQUEST_CONTEXT.try_with(Clone::clone).ok()
}

/// The bound request ID, or a freshly generated one outside a request.
pub fn request_id() -> String {
    REQUEST_CONTEXT
        .try_with(|ctx| ctx.request_id.clone())
        .unwrap_or_else(|_| new_request_id())
}

/// The bound client IP, or `"unknown"` outside a request.
pub fn client_ip() -> String {
    REQUEST_CONTEXT
        .try_with(|ctx| ctx.client_ip.clone())
        .unwrap_or_else(|_| UNKNOWN_CLIENT_IP.to_string())
}

fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}
