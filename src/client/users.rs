use std::time::Duration;

use serde_json::Value;

use super::cache::{QueryCache, QueryFilter, QueryKey, QueryOptions};
use super::error::{ClientError, ClientResult};
use super::rest::RestClient;
use super::retry::RetryPolicy;
use crate::models::{RegisterUserInput, UpdateUserInput, User};

pub mod keys {
    use super::QueryKey;

    pub const ROOT: &str = "users";

    pub fn detail(user_id: &str) -> QueryKey {
        QueryKey::from([ROOT, "detail", user_id])
    }
}

/// Photo removal retries twice, except when the photo is already gone.
const DELETE_PHOTO_RETRY: RetryPolicy = RetryPolicy::new(2).retry_if(not_found_is_final);

fn not_found_is_final(err: &ClientError) -> bool {
    !err.is_not_found()
}

#[derive(Debug, Clone)]
pub struct UsersApi {
    rest: RestClient,
    cache: QueryCache,
}

impl UsersApi {
    pub fn new(rest: RestClient, cache: QueryCache) -> Self {
        Self { rest, cache }
    }

    pub async fn user(&self, user_id: &str) -> ClientResult<Option<User>> {
        let url = self.rest.url(&["api", "users", user_id])?;
        self.cache
            .fetch(keys::detail(user_id), &QueryOptions::new(Duration::ZERO), || {
                self.rest.get(url.clone())
            })
            .await
    }

    /// Create an account without signing in.
    pub async fn register(&self, input: &RegisterUserInput) -> ClientResult<Option<Value>> {
        let url = self.rest.url(&["api", "auth", "register"])?;
        let result = self.rest.post(url, input).await;
        match &result {
            Ok(_) => tracing::info!(email = %input.email, "User registered"),
            Err(err) => tracing::error!("Error registering user: {}", err),
        }
        result
    }

    /// Update a profile. The stored session user follows when it is the same user.
    pub async fn update(&self, user_id: &str, input: &UpdateUserInput) -> ClientResult<User> {
        let url = self.rest.url(&["api", "users", user_id])?;
        let result = self
            .rest
            .put::<User, _>(url, input)
            .await
            .and_then(|user| user.ok_or(ClientError::EmptyBody));

        match &result {
            Ok(user) => {
                self.cache.set_as(keys::detail(&user.id), user);
                if let Err(err) = self.rest.session().update_user(user) {
                    tracing::warn!("Profile updated but the local session was not: {}", err);
                }
            }
            Err(err) => tracing::error!("Error updating user: {}", err),
        }

        self.cache.invalidate(&QueryFilter::root(keys::ROOT));
        result
    }

    pub async fn delete(&self, user_id: &str) -> ClientResult<()> {
        let url = self.rest.url(&["api", "users", user_id])?;
        let result = self.rest.delete::<Value>(url).await.map(|_| ());
        if result.is_ok() {
            self.cache.remove(&keys::detail(user_id));
        }
        self.cache.invalidate(&QueryFilter::root(keys::ROOT));
        result
    }

    pub async fn photo(&self, user_id: &str) -> ClientResult<(Vec<u8>, String)> {
        let url = self.rest.url(&["api", "users", user_id, "photo"])?;
        super::image::fetch_image_bytes(&self.rest, url).await
    }

    pub async fn upload_photo(&self, user_id: &str, file_name: &str, bytes: Vec<u8>, mime: &str) -> ClientResult<Option<Value>> {
        let url = self.rest.url(&["api", "users", user_id, "photo"])?;
        let result = self.rest.upload(url, file_name, bytes, mime).await;
        match &result {
            Ok(_) => {
                self.cache.invalidate(&QueryFilter::Exact(keys::detail(user_id)));
            }
            Err(err) => tracing::error!("Error uploading user photo: {}", err),
        }
        result
    }

    /// Remove the profile photo. A photo that is already gone counts as removed.
    pub async fn delete_photo(&self, user_id: &str) -> ClientResult<()> {
        let url = self.rest.url(&["api", "users", user_id, "photo"])?;
        let result = DELETE_PHOTO_RETRY
            .run(|| self.rest.delete::<Value>(url.clone()))
            .await;

        let result = match result {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => {
                tracing::debug!(user_id, "User photo already deleted");
                Ok(())
            }
            Err(err) => {
                tracing::error!("Error deleting user photo: {}", err);
                Err(err)
            }
        };

        if result.is_ok() {
            self.cache.invalidate(&QueryFilter::Exact(keys::detail(user_id)));
        }
        result
    }
}
