// handlers/auth/session.rs - Session passthrough (register, refresh, logout, profile)

use axum::{body::Bytes, extract::State, http::Method, response::Response};

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::v1;
use crate::middleware::Forwarded;
use crate::proxy::parse_optional_json_body;

/// POST /api/auth/register
pub async fn register(State(state): State<AppState>, forwarded: Forwarded, body: Bytes) -> Result<Response, ApiError> {
    let body = parse_optional_json_body(&body)?;
    state
        .upstream
        .forward_json(Method::POST, &v1(&["auth", "register"]), &forwarded, body)
        .await
}

/// POST /api/auth/refresh
pub async fn refresh(State(state): State<AppState>, forwarded: Forwarded, body: Bytes) -> Result<Response, ApiError> {
    let body = parse_optional_json_body(&body)?;
    state
        .upstream
        .forward_json(Method::POST, &v1(&["auth", "refresh"]), &forwarded, body)
        .await
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>, forwarded: Forwarded, body: Bytes) -> Result<Response, ApiError> {
    let body = parse_optional_json_body(&body)?;
    state
        .upstream
        .forward_json(Method::POST, &v1(&["auth", "logout"]), &forwarded, body)
        .await
}

/// GET /api/auth/profile
pub async fn profile(State(state): State<AppState>, forwarded: Forwarded) -> Result<Response, ApiError> {
    state
        .upstream
        .forward_json(Method::GET, &v1(&["auth", "profile"]), &forwarded, None)
        .await
}
