//! Unified error handling with Sentry integration.
//!
//! Handlers return `Result<T, AppError>`. `AppError` only picks the status and
//! a client-safe message. [`render_errors`] decides the representation from
//! the request path: JSON under `/api`, an HTML page everywhere else. Bare
//! error responses from static file serving and caught panics are rendered
//! the same way.

use std::any::Any;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::Request,
    http::{StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Client-facing message of an error response, attached as an extension.
#[derive(Debug, Clone)]
pub struct ErrorMessage(pub String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let message = match self {
            Self::NotFound(msg) => msg,
            Self::Internal(_) => "Internal server error".to_string(),
        };

        let mut response = (status, message.clone()).into_response();
        response.extensions_mut().insert(ErrorMessage(message));
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// JSON body for API errors.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
    pub status: u16,
}

/// HTML error page.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub reason: String,
    pub message: String,
}

/// Whether `path` belongs to the JSON API.
#[must_use]
pub fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

/// Render error responses as JSON for `/api` paths and as HTML otherwise.
pub async fn render_errors(request: Request, next: Next) -> Response {
    let api = is_api_path(request.uri().path());
    let response = next.run(request).await;

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let message = match response.extensions().get::<ErrorMessage>() {
        Some(ErrorMessage(message)) => message.clone(),
        None if !response.headers().contains_key(CONTENT_TYPE) => {
            status.canonical_reason().unwrap_or("Error").to_string()
        }
        // Already has a body of its own
        None => return response,
    };

    if api {
        (
            status,
            Json(ApiErrorBody {
                error: message,
                status: status.as_u16(),
            }),
        )
            .into_response()
    } else {
        (
            status,
            ErrorTemplate {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Error").to_string(),
                message,
            },
        )
            .into_response()
    }
}

/// Turn a caught handler panic into a 500 that [`render_errors`] renders.
#[allow(clippy::needless_pass_by_value)]
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    AppError::Internal(format!("handler panicked: {detail}")).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("app-123".to_string());
        assert_eq!(err.to_string(), "Not found: app-123");

        let err = AppError::Internal("disk full".to_string());
        assert_eq!(err.to_string(), "Internal error: disk full");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let response = AppError::Internal("db password wrong".to_string()).into_response();
        let ErrorMessage(message) = response.extensions().get::<ErrorMessage>().unwrap();
        assert_eq!(message, "Internal server error");
    }

    #[test]
    fn test_panic_response() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<ErrorMessage>().is_some());
    }

    #[test]
    fn test_is_api_path() {
        assert!(is_api_path("/api"));
        assert!(is_api_path("/api/status"));
        assert!(!is_api_path("/apis"));
        assert!(!is_api_path("/apps/api"));
    }
}
