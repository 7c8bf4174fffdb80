// handlers/auth/login.rs - POST /api/auth/login handler
//
// Tries the API gateway first and falls back to the auth service when the
// gateway is unreachable or failing. A credential rejection from the gateway
// is final.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::v1;
use crate::middleware::Forwarded;
use crate::proxy::{parse_json_body, Upstream};

pub const CREDENTIALS_REQUIRED: &str = "Email and password are required";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const LOGIN_UNAVAILABLE: &str = "Login service unavailable";

/// Validated login input.
#[derive(Debug)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

impl<'a> Credentials<'a> {
    /// Both fields must be present, strings and non-empty.
    fn from_payload(payload: &'a Value) -> Option<Self> {
        let field = |name: &str| {
            payload
                .get(name)
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
        };
        Some(Self {
            email: field("email")?,
            password: field("password")?,
        })
    }

    fn to_json(&self) -> Value {
        json!({ "email": self.email, "password": self.password })
    }
}

/// What the auth services answer on success.
#[derive(Debug, Deserialize)]
struct UpstreamLogin {
    user: Option<Value>,
    access_token: Option<Value>,
    token_type: Option<Value>,
    expires_in: Option<Value>,
    refresh_token: Option<Value>,
}

/// What the browser receives on success.
#[derive(Debug, Serialize)]
struct LoginEnvelope {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_type: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_in: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<Value>,
}

impl From<UpstreamLogin> for LoginEnvelope {
    fn from(login: UpstreamLogin) -> Self {
        Self {
            success: true,
            user: login.user,
            token: login.access_token,
            token_type: login.token_type,
            expires_in: login.expires_in,
            refresh_token: login.refresh_token,
        }
    }
}

/// Outcome of one hop of the chain.
enum Attempt {
    Accepted(reqwest::Response),
    Rejected(StatusCode),
    Unavailable(String),
}

async fn attempt(hop: &Upstream, credentials: &Credentials<'_>) -> Result<Attempt, ApiError> {
    let url = hop.url(&v1(&["auth", "login"]), None)?;
    let sent = hop
        .request(Method::POST, url, &Forwarded::default())
        .header(header::CONTENT_TYPE, "application/json")
        .json(&credentials.to_json())
        .send()
        .await;

    let response = match sent {
        Ok(response) => response,
        Err(err) => return Ok(Attempt::Unavailable(err.to_string())),
    };

    let status = response.status();
    Ok(if status.is_success() {
        Attempt::Accepted(response)
    } else if status.is_server_error() {
        Attempt::Unavailable(format!("status {status}"))
    } else {
        Attempt::Rejected(status)
    })
}

async fn success(response: reqwest::Response) -> Result<Response, ApiError> {
    let bytes = response.bytes().await?;
    let login: UpstreamLogin = serde_json::from_slice(&bytes)?;
    Ok((StatusCode::OK, Json(LoginEnvelope::from(login))).into_response())
}

/// POST /api/auth/login - exchange credentials for tokens
pub async fn post(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let payload = parse_json_body(&body)?;
    let credentials = Credentials::from_payload(&payload).ok_or_else(|| ApiError::bad_request(CREDENTIALS_REQUIRED))?;

    tracing::info!(email = credentials.email, "Login attempt");

    match attempt(&state.gateway, &credentials).await? {
        Attempt::Accepted(response) => return success(response).await,
        Attempt::Rejected(status) => {
            tracing::warn!(%status, "Gateway rejected credentials");
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        }
        Attempt::Unavailable(reason) => {
            tracing::warn!(%reason, "Gateway login unavailable, trying auth service");
        }
    }

    match attempt(&state.auth_service, &credentials).await? {
        Attempt::Accepted(response) => success(response).await,
        Attempt::Rejected(StatusCode::UNAUTHORIZED) => {
            tracing::warn!("Auth service rejected credentials");
            Err(ApiError::unauthorized(INVALID_CREDENTIALS))
        }
        Attempt::Rejected(status) => {
            tracing::error!(%status, "Auth service refused login");
            Err(ApiError::bad_gateway(LOGIN_UNAVAILABLE))
        }
        Attempt::Unavailable(reason) => {
            tracing::error!(%reason, "Auth service unavailable");
            Err(ApiError::bad_gateway(LOGIN_UNAVAILABLE))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_require_non_empty_strings() {
        assert!(Credentials::from_payload(&json!({ "email": "a@b.c", "password": "pw" })).is_some());
        assert!(Credentials::from_payload(&json!({ "email": "a@b.c" })).is_none());
        assert!(Credentials::from_payload(&json!({ "email": "", "password": "pw" })).is_none());
        assert!(Credentials::from_payload(&json!({ "email": "a@b.c", "password": 42 })).is_none());
        assert!(Credentials::from_payload(&json!({ "email": null, "password": "pw" })).is_none());
        assert!(Credentials::from_payload(&json!(["a@b.c", "pw"])).is_none());
    }

    #[test]
    fn envelope_renames_access_token_and_omits_missing_fields() {
        let login: UpstreamLogin = serde_json::from_value(json!({
            "access_token": "abc",
            "token_type": "bearer",
            "user": { "id": 1, "email": "a@b.c" }
        }))
        .unwrap();

        let envelope = serde_json::to_value(LoginEnvelope::from(login)).unwrap();
        assert_eq!(
            envelope,
            json!({
                "success": true,
                "user": { "id": 1, "email": "a@b.c" },
                "token": "abc",
                "token_type": "bearer"
            })
        );
    }
}
