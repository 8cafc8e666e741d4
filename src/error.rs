//! Error types for wolf.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::proxy::types::ErrorBody;

/// Result type alias for wolf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for wolf.
///
/// Every variant is turned into a response at the handler boundary. Caller
/// facing messages are fixed strings; the detail only reaches the log.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Not found")]
    NotFound,

    #[error("Failed to read '{path}': {source}")]
    StaticAsset {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::InvalidRequest(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Invalid request"),
            Error::Upstream(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process request",
            ),
            Error::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process request",
            ),
            Error::NotFound => (StatusCode::NOT_FOUND, "Not found"),
            // The page route answers in plain text, unlike the JSON API.
            Error::StaticAsset { .. } => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                    "Error loading page",
                )
                    .into_response();
            }
        };

        (status, Json(ErrorBody::new(message))).into_response()
    }
}
