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
use crate::proxy::parse_json_body;

/// GET /api/users/:user_id
pub async fn show(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    forwarded: Forwarded,
) -> Result<Response, ApiError> {
    state
        .upstream
        .forward_json(Method::GET, &v1(&["users", user_id.as_str()]), &forwarded, None)
        .await
}

/// PUT /api/users/:user_id
pub async fn update(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    forwarded: Forwarded,
    body: Bytes,
) -> Result<Response, ApiError> {
    let body = parse_json_body(&body)?;
    state
        .upstream
        .forward_json(Method::PUT, &v1(&["users", user_id.as_str()]), &forwarded, Some(body))
        .await
}

/// DELETE /api/users/:user_id
pub async fn delete(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    forwarded: Forwarded,
) -> Result<Response, ApiError> {
    state
        .upstream
        .forward_json(Method::DELETE, &v1(&["users", user_id.as_str()]), &forwarded, None)
        .await
}
