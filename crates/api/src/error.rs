//! Unified error handling with Sentry integration.
//!
//! Every failure the API reports to a client goes through [`AppError`], so
//! the body is always `{"error": "..."}`. Every error is logged before
//! responding: client errors at `warn`, server errors at `error` with a
//! Sentry capture. Server error details never reach the client.

use std::any::Any;
use std::path::PathBuf;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Body returned for every 5xx response.
const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal Server Error";

/// Body returned for unknown routes and unsupported methods.
const NOT_FOUND_MESSAGE: &str = "Not Found";

/// Failure to serve the `OpenAPI` document.
#[derive(Debug, Error)]
pub enum OpenApiError {
    /// The YAML file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The YAML has no JSON representation (e.g. tagged values).
    #[error("failed to convert {path} to JSON: {source}")]
    Convert {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// No route matches the request path or method.
    #[error("Not Found")]
    NotFound,

    /// An error with a status chosen by the handler.
    ///
    /// Statuses below 400 are not errors and are reported as 500.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// The `OpenAPI` document could not be served.
    #[error("OpenAPI error: {0}")]
    OpenApi(#[from] OpenApiError),

    /// A handler panicked.
    #[error("Handler panicked: {0}")]
    Panic(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl AppError {
    /// Error with an explicit status and client-facing message.
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// The HTTP status this error is reported with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Status { status, .. } if status.as_u16() >= 400 => *status,
            Self::Status { .. } | Self::OpenApi(_) | Self::Panic(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                status = status.as_u16(),
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Request error");
        }

        // Don't expose internal error details to clients
        let message = match &self {
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => INTERNAL_SERVER_ERROR_MESSAGE,
            Self::NotFound => NOT_FOUND_MESSAGE,
            Self::Status { message, .. } => message.as_str(),
            _ => status.canonical_reason().unwrap_or(INTERNAL_SERVER_ERROR_MESSAGE),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Fallback for unmatched routes and methods.
pub async fn not_found() -> AppError {
    AppError::NotFound
}

/// Convert a caught handler panic into the global error response.
#[allow(clippy::needless_pass_by_value)]
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| (*s).to_owned()))
        .unwrap_or_else(|| "unknown panic payload".to_owned());

    AppError::Panic(detail).into_response()
}
