use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::cache::{QueryCache, QueryKey, QueryOptions};
use super::error::{ClientError, ClientResult};
use super::rest::RestClient;
use super::retry::RetryPolicy;
use crate::models::{RegisterUserInput, User};

const PROFILE_STALE: Duration = Duration::from_secs(5 * 60);

pub mod keys {
    use super::QueryKey;

    pub const ROOT: &str = "auth";

    pub fn profile() -> QueryKey {
        QueryKey::from([ROOT, "profile"])
    }
}

/// Tokens plus the signed-in user. The BFF renames `access_token` to `token`;
/// both spellings are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "access_token")]
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<Value>,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    #[serde(alias = "token")]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

fn retry_unless_unauthorized(err: &ClientError) -> bool {
    !err.is_unauthorized()
}

#[derive(Debug, Clone)]
pub struct AuthApi {
    rest: RestClient,
    cache: QueryCache,
}

impl AuthApi {
    pub fn new(rest: RestClient, cache: QueryCache) -> Self {
        Self { rest, cache }
    }

    /// The signed-in user's profile. A 401 is final.
    pub async fn profile(&self) -> ClientResult<Option<User>> {
        let url = self.rest.url(&["api", "auth", "profile"])?;
        let options = QueryOptions::new(PROFILE_STALE)
            .retry(RetryPolicy::query_default().retry_if(retry_unless_unauthorized));
        self.cache
            .fetch(keys::profile(), &options, || self.rest.get(url.clone()))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<LoginResponse> {
        let url = self.rest.url(&["api", "auth", "login"])?;
        let login = self
            .rest
            .post::<LoginResponse, _>(url, &json!({ "email": email, "password": password }))
            .await?
            .ok_or(ClientError::EmptyBody)?;

        self.start_session(&login)?;
        Ok(login)
    }

    /// Register and, when the server hands out tokens, sign in.
    pub async fn register(&self, input: &RegisterUserInput) -> ClientResult<Option<LoginResponse>> {
        let url = self.rest.url(&["api", "auth", "register"])?;
        let body = self
            .rest
            .post::<Value, _>(url, input)
            .await?
            .ok_or(ClientError::EmptyBody)?;

        match serde_json::from_value::<LoginResponse>(body) {
            Ok(login) => {
                self.start_session(&login)?;
                Ok(Some(login))
            }
            Err(_) => Ok(None),
        }
    }

    /// Sign out locally whatever the server says; its answer is still returned.
    pub async fn logout(&self) -> ClientResult<()> {
        let refresh_token = self.rest.session().refresh_token();
        let url = self.rest.url(&["api", "auth", "logout"])?;
        let result = self
            .rest
            .post::<Value, _>(url, &json!({ "refresh_token": refresh_token }))
            .await
            .map(|_| ());

        if let Err(err) = &result {
            tracing::warn!("Server logout failed, clearing local session anyway: {}", err);
        }

        self.rest.session().sign_out()?;
        self.cache.clear();
        result
    }

    pub async fn refresh(&self) -> ClientResult<RefreshResponse> {
        let refresh_token = self.rest.session().refresh_token().ok_or(ClientError::NoRefreshToken)?;
        let url = self.rest.url(&["api", "auth", "refresh"])?;
        let refreshed = self
            .rest
            .post::<RefreshResponse, _>(url, &json!({ "refresh_token": refresh_token }))
            .await?
            .ok_or(ClientError::EmptyBody)?;

        self.rest
            .session()
            .set_tokens(refreshed.access_token.clone(), refreshed.refresh_token.clone())?;
        Ok(refreshed)
    }

    fn start_session(&self, login: &LoginResponse) -> ClientResult<()> {
        self.rest
            .session()
            .sign_in(login.token.clone(), login.refresh_token.clone(), login.user.clone())?;
        self.cache.set_as(keys::profile(), &login.user);
        Ok(())
    }
}
