// handlers/plants/photo.rs - Plant photo download and upload
//
// Both directions retry once against the plants service when the first
// attempt answers non-2xx.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::Response,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::v1;
use crate::middleware::Forwarded;
use crate::proxy::{error_from_response, relay_image, relay_json};

pub const PLANT_PHOTO_FETCH_FAILED: &str = "Failed to fetch plant photo";

/// GET /api/plants/:plant_id/photo
pub async fn get(
    State(state): State<AppState>,
    Path(plant_id): Path<String>,
    forwarded: Forwarded,
) -> Result<Response, ApiError> {
    let segments = v1(&["plants", plant_id.as_str(), "photo"]);

    let first = state.upstream.fetch_image(&segments, &forwarded).await?;
    if first.status().is_success() {
        return relay_image(first).await;
    }
    tracing::debug!(status = %first.status(), %plant_id, "Plant photo fetch failed, retrying");

    let retry = state.plants_service.fetch_image(&segments, &forwarded).await?;
    if retry.status().is_success() {
        return relay_image(retry).await;
    }
    Err(ApiError::upstream(retry.status(), PLANT_PHOTO_FETCH_FAILED))
}

/// POST /api/plants/:plant_id/photo - multipart body relayed byte for byte
pub async fn post(
    State(state): State<AppState>,
    Path(plant_id): Path<String>,
    forwarded: Forwarded,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let segments = v1(&["plants", plant_id.as_str(), "photo"]);
    let content_type = headers.get(header::CONTENT_TYPE).cloned();

    let mut response = state
        .upstream
        .forward_raw(Method::POST, &segments, &forwarded, body.clone(), content_type.clone())
        .await?;

    if !response.status().is_success() {
        tracing::debug!(status = %response.status(), %plant_id, "Plant photo upload failed, retrying");
        response = state
            .plants_service
            .forward_raw(Method::POST, &segments, &forwarded, body, content_type)
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
    }

    let mut relayed = relay_json(response).await?;
    *relayed.status_mut() = StatusCode::OK;
    Ok(relayed)
}
