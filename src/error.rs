//! Application error carried from handlers and startup code to the client.

use axum::http::StatusCode;
use serde_json::{Map, Value};
use thiserror::Error;

/// An error with a client-facing message, an HTTP status and free-form
/// details.
///
/// Returned by handlers as `Result<_, ApiError>`; the HTTP layer renders it
/// as `{"success": false, "message": ..., "details": ...}` and logs it once.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ApiError {
    message: String,
    status: StatusCode,
    details: Map<String, Value>,
}

impl ApiError {
    /// A 500 error with empty details.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            details: Map::new(),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_details(mut self, details: Map<String, Value>) -> Self {
        self.details = details;
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn not_found(path: &str) -> Self {
        Self::new("Not Found")
            .with_status(StatusCode::NOT_FOUND)
            .with_detail("path", path)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn details(&self) -> &Map<String, Value> {
        &self.details
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_defaults_to_internal_error() {
        let err = ApiError::new("boom");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.details().is_empty());
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_builders() {
        let err = ApiError::new("Database connection error")
            .with_status(StatusCode::SERVICE_UNAVAILABLE)
            .with_detail("error", "timeout")
            .with_detail("attempts", 3);

        assert_eq!(err.message(), "Database connection error");
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            Value::Object(err.details().clone()),
            json!({"error": "timeout", "attempts": 3})
        );
    }

    #[test]
    fn test_with_details_replaces() {
        let mut details = Map::new();
        details.insert("field".into(), json!("email"));

        let err = ApiError::new("Invalid input")
            .with_detail("stale", true)
            .with_details(details);

        assert_eq!(Value::Object(err.details().clone()), json!({"field": "email"}));
    }

    #[test]
    fn test_not_found() {
        let err = ApiError::not_found("/missing");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.details()["path"], "/missing");
    }
}
