//! The single outbound call to the completion API.

use axum::body::Bytes;
use axum::http::header;
use reqwest::Client;

use super::types::UpstreamRequest;
use crate::config::UpstreamConfig;
use crate::error::{Error, Result};

/// POST `payload` to the configured upstream and return its full response body.
///
/// The upstream status code is only logged:
/// provider error payloads are relayed to the caller like any other body.
/// Only transport failures (DNS, refused, reset, truncated body) are errors.
/// There is one attempt and no timeout.
pub async fn forward(
    client: &Client,
    upstream: &UpstreamConfig,
    payload: &UpstreamRequest,
) -> Result<Bytes> {
    let body = serde_json::to_vec(payload).map_err(|e| Error::InvalidRequest(e.to_string()))?;

    tracing::debug!(
        url = %upstream.url,
        bytes = body.len(),
        "Forwarding chat request upstream"
    );

    // reqwest derives Content-Length from the byte body.
    let response = client
        .post(&upstream.url)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, upstream.bearer())
        .body(body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(status = %status, "Upstream returned non-success status, relaying body");
    }

    let bytes = response.bytes().await?;
    tracing::debug!(status = %status, bytes = bytes.len(), "Upstream response received");

    Ok(bytes)
}
