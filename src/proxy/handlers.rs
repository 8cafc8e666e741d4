//! HTTP request handlers.

use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    Json,
};
use tracing::Instrument;

use super::server::AppState;
use super::types::{ChatRequest, HealthStatus};
use super::upstream;
use crate::error::Error;

/// Handle POST /api/chat
///
/// The whole inbound body is read before anything is sent upstream, and the
/// whole upstream body is read before anything is sent back.
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, Error> {
    let body = body.map_err(|e| {
        tracing::error!(error = %e, "Failed to read request body");
        Error::InvalidRequest(e.to_string())
    })?;

    let request = ChatRequest::from_slice(&body).map_err(|e| {
        tracing::error!(error = %e, bytes = body.len(), "Invalid chat request");
        Error::InvalidRequest(e.to_string())
    })?;

    tracing::info!(
        model = ?request.model,
        has_messages = request.messages.is_some(),
        "Received chat request"
    );

    let payload = request.into_upstream(&state.config.upstream);

    // Spawned so the upstream call completes even if the caller goes away.
    let client = state.http_client.clone();
    let config = state.config.clone();
    let call = async move {
        upstream::forward(&client, &config.upstream, &payload)
            .await
            .inspect_err(|e| {
                tracing::error!(error = %e, url = %config.upstream.url, "Upstream call failed");
            })
    };
    let relayed = tokio::spawn(call.in_current_span()).await.map_err(|e| {
        tracing::error!(error = %e, "Upstream task aborted");
        Error::Internal(e.to_string())
    })??;

    // 200 regardless of the upstream status.
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Body::from(relayed),
    )
        .into_response())
}

/// Handle GET / - serve the chat page
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, Error> {
    let path = &state.config.site.index_path;
    tokio::fs::read_to_string(path)
        .await
        .map(Html)
        .map_err(|e| {
            tracing::error!(error = %e, path = %path.display(), "Failed to read index page");
            Error::StaticAsset {
                path: path.display().to_string(),
                source: e,
            }
        })
}

/// Handle GET /health
///
/// Liveness only; the upstream is not probed.
pub async fn health() -> impl IntoResponse {
    Json(HealthStatus::OK)
}

/// Fallback for unknown paths and unsupported methods on known paths.
pub async fn not_found() -> Error {
    Error::NotFound
}

/// Answer every OPTIONS request with an empty 200 before routing.
pub async fn preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}
