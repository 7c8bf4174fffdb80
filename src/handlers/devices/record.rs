use axum::{
    body::Bytes,
    extract::{Path, State},
    http::Method,
    response::Response,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::v1;
use crate::middleware::Forwarded;
use crate::proxy::{parse_json_body, parse_optional_json_body};

/// GET /api/devices/:device_id
pub async fn show(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    forwarded: Forwarded,
) -> Result<Response, ApiError> {
    state
        .upstream
        .forward_json(Method::GET, &v1(&["devices", device_id.as_str()]), &forwarded, None)
        .await
}

/// PUT /api/devices/:device_id
pub async fn update(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    forwarded: Forwarded,
    body: Bytes,
) -> Result<Response, ApiError> {
    let body = parse_json_body(&body)?;
    state
        .upstream
        .forward_json(Method::PUT, &v1(&["devices", device_id.as_str()]), &forwarded, Some(body))
        .await
}

/// DELETE /api/devices/:device_id
pub async fn delete(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    forwarded: Forwarded,
) -> Result<Response, ApiError> {
    state
        .upstream
        .forward_json(Method::DELETE, &v1(&["devices", device_id.as_str()]), &forwarded, None)
        .await
}

/// POST /api/devices/:device_id/assign
pub async fn assign(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    forwarded: Forwarded,
    body: Bytes,
) -> Result<Response, ApiError> {
    let body = parse_optional_json_body(&body)?;
    state
        .upstream
        .forward_json(Method::POST, &v1(&["devices", device_id.as_str(), "assign"]), &forwarded, body)
        .await
}

/// POST /api/devices/:device_id/unassign
pub async fn unassign(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    forwarded: Forwarded,
    body: Bytes,
) -> Result<Response, ApiError> {
    let body = parse_optional_json_body(&body)?;
    state
        .upstream
        .forward_json(Method::POST, &v1(&["devices", device_id.as_str(), "unassign"]), &forwarded, body)
        .await
}
