// handlers/plants/devices.rs - Devices attached to a plant

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

/// GET /api/plants/:plant_id/devices
pub async fn list(
    State(state): State<AppState>,
    Path(plant_id): Path<String>,
    forwarded: Forwarded,
) -> Result<Response, ApiError> {
    state
        .upstream
        .forward_json(Method::GET, &v1(&["plants", plant_id.as_str(), "devices"]), &forwarded, None)
        .await
}

/// POST /api/plants/:plant_id/devices/:device_id
pub async fn assign(
    State(state): State<AppState>,
    Path((plant_id, device_id)): Path<(String, String)>,
    forwarded: Forwarded,
    body: Bytes,
) -> Result<Response, ApiError> {
    let body = parse_optional_json_body(&body)?;
    state
        .upstream
        .forward_json(
            Method::POST,
            &v1(&["plants", plant_id.as_str(), "devices", device_id.as_str()]),
            &forwarded,
            body,
        )
        .await
}

/// DELETE /api/plants/:plant_id/devices/:device_id
pub async fn remove(
    State(state): State<AppState>,
    Path((plant_id, device_id)): Path<(String, String)>,
    forwarded: Forwarded,
) -> Result<Response, ApiError> {
    state
        .upstream
        .forward_json(
            Method::DELETE,
            &v1(&["plants", plant_id.as_str(), "devices", device_id.as_str()]),
            &forwarded,
            None,
        )
        .await
}
