use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::error::{ApiError, UNKNOWN_ERROR};

const IMAGE_CACHE_CONTROL: &str = "public, max-age=3600";
const DEFAULT_IMAGE_TYPE: &str = "image/jpeg";

/// Relay a downstream JSON answer: status and body verbatim, `204` without a
/// body, and non-2xx wrapped as `{"error": <text>}`.
pub async fn relay_json(response: reqwest::Response) -> Result<Response, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(error_from_response(response).await);
    }

    if status == StatusCode::NO_CONTENT {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(status.into_response());
    }

    let data: Value = serde_json::from_slice(&bytes)?;
    Ok((status, Json(data)).into_response())
}

/// Relay image bytes with the downstream content type.
pub async fn relay_image(response: reqwest::Response) -> Result<Response, ApiError> {
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_IMAGE_TYPE));
    let bytes = response.bytes().await?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, HeaderValue::from_static(IMAGE_CACHE_CONTROL)),
        ],
        bytes,
    )
        .into_response())
}

/// Turn a non-2xx downstream answer into the relayed error envelope.
pub async fn error_from_response(response: reqwest::Response) -> ApiError {
    let status = response.status();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| UNKNOWN_ERROR.to_string());
    if status == StatusCode::NOT_FOUND {
        tracing::debug!(%status, "Upstream resource not found");
    } else {
        tracing::warn!(%status, "Upstream answered with an error");
    }
    ApiError::upstream(status, text)
}
