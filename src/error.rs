// HTTP API Error Types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// HTTP API error with appropriate status codes and client-friendly messages.
///
/// Every variant renders as the `{"error": "..."}` envelope the browser
/// expects; `Detailed` additionally carries a `message` field.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // Downstream non-2xx relayed with its own status and body text
    Upstream { status: StatusCode, body: String },

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (downstream unavailable)
    BadGateway(String),

    // Error label plus a free-form message (GraphQL proxy)
    Detailed {
        status: StatusCode,
        error: String,
        message: String,
    },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Upstream { status, .. } => *status,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Detailed { status, .. } => *status,
        }
    }

    /// Client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Upstream { body, .. } => body,
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway(msg) => msg,
            ApiError::Detailed { error, .. } => error,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ApiError::Detailed { error, message, .. } => json!({
                "error": error,
                "message": message,
            }),
            _ => json!({ "error": self.message() }),
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn upstream(status: StatusCode, body: impl Into<String>) -> Self {
        let body = body.into();
        ApiError::Upstream {
            status,
            body: if body.is_empty() { UNKNOWN_ERROR.to_string() } else { body },
        }
    }

    /// The generic 500 every proxy route falls back to.
    pub fn internal() -> Self {
        ApiError::InternalServerError(INTERNAL_SERVER_ERROR.to_string())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn detailed(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Detailed {
            status,
            error: error.into(),
            message: message.into(),
        }
    }
}

// Local failures never leak details to the caller
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("Upstream request failed: {}", err);
        ApiError::internal()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON processing failed: {}", err);
        ApiError::internal()
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        tracing::error!("Invalid upstream URL: {}", err);
        ApiError::internal()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_keeps_downstream_status() {
        let err = ApiError::upstream(StatusCode::NOT_FOUND, "plant not found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_json(), json!({ "error": "plant not found" }));
    }

    #[test]
    fn empty_upstream_body_becomes_unknown_error() {
        let err = ApiError::upstream(StatusCode::BAD_GATEWAY, "");
        assert_eq!(err.message(), UNKNOWN_ERROR);
    }

    #[test]
    fn detailed_error_has_message_field() {
        let err = ApiError::detailed(StatusCode::BAD_GATEWAY, "Bad Gateway", "connection refused");
        assert_eq!(
            err.to_json(),
            json!({ "error": "Bad Gateway", "message": "connection refused" })
        );
    }

    #[test]
    fn internal_error_is_generic() {
        let err: ApiError = serde_json::from_str::<Value>("{").unwrap_err().into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_json(), json!({ "error": "Internal server error" }));
    }
}
