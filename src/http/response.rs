//! Error response rendering.
//!
//! # Responsibilities
//! - Render [`ApiError`] as the JSON error envelope with its status
//! - Leave an [`ApiErrorReport`] on the response for the error boundary
//!
//! # Design Decisions
//! - Rendering never logs; logging happens once, in the error boundary,
//!   where the request path is known

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub details: Map<String, Value>,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            success: false,
            message: err.message().to_string(),
            details: err.details().clone(),
        }
    }
}

/// Response extension identifying a response produced from an [`ApiError`].
#[derive(Debug, Clone)]
pub struct ApiErrorReport(pub ApiError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::from(&self);
        let mut response = (self.status(), Json(body)).into_response();
        response.extensions_mut().insert(ApiErrorReport(self));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::{header, StatusCode};
    use serde_json::json;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_database_error_envelope() {
        let err = ApiError::new("Database connection error").with_detail("error", "timeout");
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        assert!(response.extensions().get::<ApiErrorReport>().is_some());
        assert_eq!(
            body_json(response).await,
            json!({
                "success": false,
                "message": "Database connection error",
                "details": {"error": "timeout"}
            })
        );
    }

    #[tokio::test]
    async fn test_empty_details_render_as_object() {
        let response = ApiError::new("boom").into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"success": false, "message": "boom", "details": {}})
        );
    }

    #[tokio::test]
    async fn test_status_is_preserved() {
        let response = ApiError::new("Forbidden")
            .with_status(StatusCode::FORBIDDEN)
            .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let report = response.extensions().get::<ApiErrorReport>().unwrap();
        assert_eq!(report.0.message(), "Forbidden");
    }
}
