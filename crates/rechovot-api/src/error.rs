//! HTTP error payloads.
//!
//! Every failure leaves the service as `{"error": "...", "details": "..."}`
//! with `details` omitted when there is nothing to add.

use std::fmt;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// An error returned by a handler.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    details: Option<String>,
}

impl ApiError {
    /// Create an error with a status and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    /// Attach details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// 500 Internal Server Error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// 400 Bad Request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 404 Not Found.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<rechovot_core::Error> for ApiError {
    fn from(err: rechovot_core::Error) -> Self {
        use rechovot_core::Error;

        if !err.is_client_error() {
            tracing::error!("Search backend error: {err:?}");
            return Self::internal("Search backend failure").with_details(err.to_string());
        }

        match err {
            Error::BadInput { message } => Self::bad_request(message),
            other => Self::not_found(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("Invalid request body").with_details(rejection.body_text())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rechovot_core::Error;

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            ApiError::from(Error::bad_input("Missing id")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(Error::not_found("document", "abc")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(Error::backend("index unavailable")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(Error::config("bad schema")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_client_errors_keep_their_message() {
        let bad = ApiError::from(Error::bad_input("Missing id"));
        assert_eq!(bad.message, "Missing id");
        assert!(bad.details.is_none());

        let missing = ApiError::from(Error::not_found("document", "abc"));
        assert_eq!(missing.message, "document not found: abc");
    }

    #[test]
    fn test_body_omits_empty_details() {
        let body = ErrorBody {
            error: "Missing id".to_string(),
            details: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "error": "Missing id" })
        );
    }

    #[test]
    fn test_backend_errors_carry_details() {
        let err = ApiError::from(Error::backend("index unavailable"));
        assert_eq!(err.message, "Search backend failure");
        assert!(err.details.unwrap().contains("index unavailable"));
    }
}
