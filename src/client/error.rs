use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the typed client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error! status: {status}, message: {message}")]
    Http { status: StatusCode, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response body was empty")]
    EmptyBody,

    /// Messages of every reported GraphQL error, joined by ", ".
    #[error("GraphQL errors: {0}")]
    GraphQl(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("session storage failed: {0}")]
    Session(#[from] std::io::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Unauthenticated => Some(StatusCode::UNAUTHORIZED),
            ClientError::Transport(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Build an `Http` error from a non-2xx answer. The BFF wraps failures
    /// as `{"error": "..."}`; the inner text is used when present.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        ClientError::Http {
            status,
            message: error_message(&text),
        }
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("error") {
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => body.to_string(),
        },
        _ => body.to_string(),
    }
}
