//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use std::any::Any;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Client Errors**: Wrong method or missing parameter, rejected before any store call
/// - **Dependency Errors**: The card key lookup failed
/// - **Internal Errors**: Anything unexpected
///
/// A key that does not exist is not an error; it is a normal validation result.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request used a method other than GET (or the OPTIONS pre-flight).
    ///
    /// Returns HTTP 405 Method Not Allowed.
    #[error("method not supported")]
    MethodNotAllowed,

    /// The `key` query parameter is absent or empty.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("missing key parameter")]
    MissingKey,

    /// The store could not answer the lookup.
    ///
    /// Returns HTTP 500. The String holds the detail, which is logged but
    /// never sent to the caller.
    #[error("lookup failed")]
    LookupFailed(String),

    /// Unexpected failure anywhere in the handler.
    ///
    /// Returns HTTP 500 with a generic message.
    #[error("internal error")]
    Internal(String),
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// { "error": "missing key parameter" }
/// ```
///
/// # Status Code Mapping
///
/// - `MethodNotAllowed` → 405
/// - `MissingKey` → 400
/// - `LookupFailed` → 500
/// - `Internal` → 500
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::MissingKey => StatusCode::BAD_REQUEST,
            AppError::LookupFailed(detail) => {
                tracing::error!(detail = %detail, "card key lookup failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Internal(detail) => {
                tracing::error!(detail = %detail, "internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Display strings carry no detail, only the public message
        let body = Json(json!({ "error": self.to_string() }));

        (status, body).into_response()
    }
}

/// Turn a panic caught by `CatchPanicLayer` into the generic 500 response.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::Internal(format!("handler panicked: {detail}")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn lookup_failure_hides_detail() {
        let response =
            AppError::LookupFailed("connection refused at 10.0.0.5:5432".to_string())
                .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await, json!({ "error": "lookup failed" }));
    }

    #[tokio::test]
    async fn client_errors_map_to_4xx() {
        let response = AppError::MissingKey.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_of(response).await,
            json!({ "error": "missing key parameter" })
        );

        let response = AppError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body_of(response).await,
            json!({ "error": "method not supported" })
        );
    }

    #[tokio::test]
    async fn panic_payload_is_not_leaked() {
        let response = panic_response(Box::new("index out of bounds".to_string()));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await, json!({ "error": "internal error" }));
    }
}
