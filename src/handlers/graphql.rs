// handlers/graphql.rs - /api/graphql proxy
//
// CORS headers are stamped by the route's `map_response` layer, so every
// answer below (errors included) carries them.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::v1;
use crate::middleware::Forwarded;
use crate::proxy::error_from_response;

const QUERY_ERROR: &str = "Internal Server Error";
const QUERY_UNREACHABLE: &str = "Bad Gateway";
const PLAYGROUND_ERROR: &str = "GraphQL Error";

/// OPTIONS /api/graphql - preflight, answered locally
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// POST /api/graphql - forward `{query, variables, operationName}` verbatim
pub async fn query(State(state): State<AppState>, forwarded: Forwarded, body: Bytes) -> Result<Response, ApiError> {
    let local = |err: &dyn std::fmt::Display| {
        tracing::error!("GraphQL proxy error: {}", err);
        ApiError::detailed(StatusCode::INTERNAL_SERVER_ERROR, QUERY_ERROR, err.to_string())
    };
    let unreachable = |err: reqwest::Error| {
        tracing::error!("GraphQL upstream unreachable: {}", err);
        ApiError::detailed(StatusCode::BAD_GATEWAY, QUERY_UNREACHABLE, err.to_string())
    };

    let payload: Value = serde_json::from_slice(&body).map_err(|err| local(&err))?;
    let url = state
        .graphql
        .url(&v1(&["graphql"]), None)?;

    tracing::debug!(%url, auth = forwarded.auth_flag(), "Forwarding GraphQL query");

    let response = state
        .graphql
        .request(Method::POST, url, &forwarded)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT, "application/json")
        .json(&payload)
        .send()
        .await
        .map_err(unreachable)?;

    let status = response.status();
    if !status.is_success() {
        return Err(error_from_response(response).await);
    }

    let bytes = response.bytes().await.map_err(unreachable)?;
    let data: Value = serde_json::from_slice(&bytes).map_err(|err| local(&err))?;
    Ok((status, Json(data)).into_response())
}

/// GET /api/graphql - playground page or JSON introspection
pub async fn playground(State(state): State<AppState>, forwarded: Forwarded) -> Result<Response, ApiError> {
    let failed = |status: StatusCode, err: &dyn std::fmt::Display| {
        tracing::error!("GraphQL GET error: {}", err);
        ApiError::detailed(status, PLAYGROUND_ERROR, err.to_string())
    };

    let url = state
        .graphql
        .url(&v1(&["graphql"]), forwarded.query.as_deref())?;
    let response = state
        .graphql
        .request(Method::GET, url, &forwarded)
        .header(header::ACCEPT, "text/html,application/json")
        .send()
        .await
        .map_err(|err| failed(StatusCode::BAD_GATEWAY, &err))?;

    let status = response.status();
    let is_html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("text/html"));

    let bytes = response
        .bytes()
        .await
        .map_err(|err| failed(StatusCode::BAD_GATEWAY, &err))?;

    if is_html {
        return Ok((status, [(header::CONTENT_TYPE, "text/html")], bytes).into_response());
    }

    let data: Value =
        serde_json::from_slice(&bytes).map_err(|err| failed(StatusCode::INTERNAL_SERVER_ERROR, &err))?;
    Ok((status, Json(data)).into_response())
}
