//! Error boundary.
//! Logs every `ApiError` response once, with the request path.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::http::response::ApiErrorReport;
use crate::http::server::AppState;

pub async fn error_boundary(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_owned();
    let mut response = next.run(req).await;

    if let Some(ApiErrorReport(err)) = response.extensions_mut().remove::<ApiErrorReport>() {
        let details = Value::Object(err.details().clone());
        state.logger.error(format!(
            "Error: {} | Path: {} | Details: {}",
            err.message(),
            path,
            details
        ));
    }

    response
}
