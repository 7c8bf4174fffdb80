// handlers/root.rs - Service info and liveness

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::Forwarded;

/// GET / - service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Rootly BFF",
            "version": version,
            "description": "Backend-for-frontend proxy for the Rootly plant monitoring platform",
            "endpoints": {
                "auth": "/api/auth/login, /api/auth/register, /api/auth/refresh, /api/auth/logout, /api/auth/profile",
                "plants": "/api/plants[/:plantId[/photo|/devices[/:deviceId]]], /api/plants/users/:userId",
                "devices": "/api/devices[/:deviceId[/assign|/unassign]], /api/devices/users/:userId/devices/:deviceId",
                "users": "/api/users/:userId[/photo]",
                "graphql": "/api/graphql",
                "sensors": "/api/sensors",
                "health": "/health",
            }
        }
    }))
}

/// GET /health - ping the gateway; any HTTP answer counts as reachable
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let probe = match state.health.url(&["health"], None) {
        Ok(url) => state
            .health
            .request(Method::GET, url, &Forwarded::default())
            .send()
            .await
            .map_err(|err| err.to_string()),
        Err(err) => Err(err.to_string()),
    };

    match probe {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "gateway": "ok"
            })),
        ),
        Err(err) => {
            tracing::warn!("Gateway health probe failed: {}", err);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "gateway": "unreachable"
                })),
            )
        }
    }
}
