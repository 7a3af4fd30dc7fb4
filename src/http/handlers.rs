//! Route handlers.

use axum::{extract::State, http::StatusCode, http::Uri, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::http::server::AppState;

pub const SERVICE_STATUS: &str = "OpsFlow Auth Service Running";

/// `GET /`
pub async fn root() -> Json<Value> {
    Json(json!({ "status": SERVICE_STATUS }))
}

/// `GET /health`: liveness plus a database round trip when a pool exists.
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let database = match &state.database {
        Some(pool) => {
            sqlx::query("SELECT 1")
                .execute(pool)
                .await
                .map_err(|e| {
                    ApiError::new("Database unavailable")
                        .with_status(StatusCode::SERVICE_UNAVAILABLE)
                        .with_detail("error", e.to_string())
                })?;
            "up"
        }
        None => "disabled",
    };

    Ok(Json(json!({ "status": "ok", "database": database })))
}

/// Fallback for every unrouted path.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(uri.path())
}
