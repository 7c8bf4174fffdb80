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

/// GET /api/plants - list plants (query string forwarded)
pub async fn list(State(state): State<AppState>, forwarded: Forwarded) -> Result<Response, ApiError> {
    state
        .upstream
        .forward_json(Method::GET, &v1(&["plants"]), &forwarded, None)
        .await
}

/// POST /api/plants - create plant
pub async fn create(State(state): State<AppState>, forwarded: Forwarded, body: Bytes) -> Result<Response, ApiError> {
    let body = parse_optional_json_body(&body)?;
    state
        .upstream
        .forward_json(Method::POST, &v1(&["plants"]), &forwarded, body)
        .await
}

/// GET /api/plants/users/:user_id - plants owned by one user
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    forwarded: Forwarded,
) -> Result<Response, ApiError> {
    state
        .upstream
        .forward_json(Method::GET, &v1(&["plants", "users", user_id.as_str()]), &forwarded, None)
        .await
}
