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
use crate::proxy::parse_optional_json_body;

/// GET /api/devices - list devices (query string forwarded)
pub async fn list(State(state): State<AppState>, forwarded: Forwarded) -> Result<Response, ApiError> {
    state
        .upstream
        .forward_json(Method::GET, &v1(&["devices"]), &forwarded, None)
        .await
}

/// POST /api/devices
pub async fn create(State(state): State<AppState>, forwarded: Forwarded, body: Bytes) -> Result<Response, ApiError> {
    let body = parse_optional_json_body(&body)?;
    state
        .upstream
        .forward_json(Method::POST, &v1(&["devices"]), &forwarded, body)
        .await
}

/// DELETE /api/devices/users/:user_id/devices/:device_id
pub async fn delete_for_user(
    State(state): State<AppState>,
    Path((user_id, device_id)): Path<(String, String)>,
    forwarded: Forwarded,
) -> Result<Response, ApiError> {
    state
        .upstream
        .forward_json(
            Method::DELETE,
            &v1(&["devices", "users", user_id.as_str(), "devices", device_id.as_str()]),
            &forwarded,
            None,
        )
        .await
}
