// handlers/users/photo.rs - Profile photo download, upload and removal

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, Method},
    response::Response,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::v1;
use crate::middleware::Forwarded;
use crate::proxy::{error_from_response, relay_image, relay_json};

/// GET /api/users/:user_id/photo
pub async fn get(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    forwarded: Forwarded,
) -> Result<Response, ApiError> {
    let response = state
        .upstream
        .fetch_image(&v1(&["users", user_id.as_str(), "photo"]), &forwarded)
        .await?;
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }
    relay_image(response).await
}

/// POST /api/users/:user_id/photo - multipart body relayed byte for byte
pub async fn post(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    forwarded: Forwarded,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let response = state
        .upstream
        .forward_raw(
            Method::POST,
            &v1(&["users", user_id.as_str(), "photo"]),
            &forwarded,
            body,
            headers.get(header::CONTENT_TYPE).cloned(),
        )
        .await?;
    relay_json(response).await
}

/// DELETE /api/users/:user_id/photo
pub async fn delete(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    forwarded: Forwarded,
) -> Result<Response, ApiError> {
    state
        .upstream
        .forward_json(Method::DELETE, &v1(&["users", user_id.as_str(), "photo"]), &forwarded, None)
        .await
}
