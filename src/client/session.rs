//! Persisted authentication state: the access token, the refresh token and
//! the signed-in user, stored as one JSON object.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::error::ClientResult;
use crate::models::User;

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Broadcast whenever the signed-in state flips.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthChange {
    SignedIn(User),
    SignedOut,
}

/// Shared handle to the session. Clones see the same state.
#[derive(Debug, Clone)]
pub struct SessionStore {
    data: Arc<RwLock<SessionData>>,
    path: Option<PathBuf>,
    events: broadcast::Sender<AuthChange>,
}

impl SessionStore {
    pub fn in_memory() -> Self {
        Self::with_data(SessionData::default(), None)
    }

    /// Load from `path`. A missing file is an empty session; an unreadable or
    /// corrupt one is discarded.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<SessionData>(&text) {
                Ok(data) => data,
                Err(err) => {
                    tracing::warn!("Discarding corrupt session file {}: {}", path.display(), err);
                    if let Err(err) = fs::remove_file(&path) {
                        tracing::warn!("Failed to remove {}: {}", path.display(), err);
                    }
                    SessionData::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => SessionData::default(),
            Err(err) => {
                tracing::warn!("Failed to read session file {}: {}", path.display(), err);
                SessionData::default()
            }
        };
        Self::with_data(data, Some(path))
    }

    fn with_data(data: SessionData, path: Option<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            data: Arc::new(RwLock::new(data)),
            path,
            events,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn snapshot(&self) -> SessionData {
        self.data.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.snapshot().access_token
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.snapshot().refresh_token
    }

    pub fn user(&self) -> Option<User> {
        self.snapshot().user
    }

    /// Signed in means both a token and a user are present.
    pub fn is_authenticated(&self) -> bool {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.access_token.is_some() && data.user.is_some()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }

    pub fn sign_in(&self, access_token: String, refresh_token: Option<String>, user: User) -> ClientResult<()> {
        self.replace(SessionData {
            access_token: Some(access_token),
            refresh_token,
            user: Some(user.clone()),
        })?;
        self.emit(AuthChange::SignedIn(user));
        Ok(())
    }

    /// Rotate tokens without touching the user. The refresh token is kept
    /// when the server did not issue a new one.
    pub fn set_tokens(&self, access_token: String, refresh_token: Option<String>) -> ClientResult<()> {
        let mut data = self.snapshot();
        data.access_token = Some(access_token);
        if refresh_token.is_some() {
            data.refresh_token = refresh_token;
        }
        self.replace(data)
    }

    /// Store `user` if it is the signed-in user. Returns whether it was stored.
    pub fn update_user(&self, user: &User) -> ClientResult<bool> {
        let mut data = self.snapshot();
        match &data.user {
            Some(current) if current.id == user.id => {
                data.user = Some(user.clone());
                self.replace(data)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn sign_out(&self) -> ClientResult<()> {
        self.replace(SessionData::default())?;
        self.emit(AuthChange::SignedOut);
        Ok(())
    }

    fn replace(&self, data: SessionData) -> ClientResult<()> {
        *self.data.write().unwrap_or_else(PoisonError::into_inner) = data.clone();
        self.persist(&data)
    }

    fn persist(&self, data: &SessionData) -> ClientResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if *data == SessionData::default() {
            match fs::remove_file(path) {
                Err(err) if err.kind() != std::io::ErrorKind::NotFound => return Err(err.into()),
                _ => return Ok(()),
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(data)?)?;
        Ok(())
    }

    fn emit(&self, change: AuthChange) {
        // No subscribers is fine
        let _ = self.events.send(change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> User {
        serde_json::from_value(serde_json::json!({ "id": id, "email": "ana@rootly.dev" })).unwrap()
    }

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("rootly-session-{}", uuid::Uuid::new_v4()))
            .join("session.json")
    }

    #[test]
    fn authenticated_needs_token_and_user() {
        let store = SessionStore::in_memory();
        assert!(!store.is_authenticated());

        store.set_tokens("abc".into(), None).unwrap();
        assert!(!store.is_authenticated());

        store.sign_in("abc".into(), Some("r1".into()), user("1")).unwrap();
        assert!(store.is_authenticated());
        assert_eq!(store.refresh_token().as_deref(), Some("r1"));
    }

    #[test]
    fn persists_and_reloads() {
        let path = temp_path();
        let store = SessionStore::load(&path);
        store.sign_in("abc".into(), Some("r1".into()), user("7")).unwrap();

        let reloaded = SessionStore::load(&path);
        assert_eq!(reloaded.access_token().as_deref(), Some("abc"));
        assert_eq!(reloaded.user().unwrap().id, "7");

        reloaded.sign_out().unwrap();
        assert!(!path.exists());
        assert!(SessionStore::load(&path).access_token().is_none());
    }

    #[test]
    fn corrupt_file_is_discarded() {
        let path = temp_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        let store = SessionStore::load(&path);
        assert!(store.access_token().is_none());
        assert!(store.user().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn update_user_only_for_same_id() {
        let store = SessionStore::in_memory();
        store.sign_in("abc".into(), None, user("1")).unwrap();

        let mut renamed = user("1");
        renamed.first_name = Some("Ana".into());
        assert!(store.update_user(&renamed).unwrap());
        assert_eq!(store.user().unwrap().first_name.as_deref(), Some("Ana"));

        assert!(!store.update_user(&user("2")).unwrap());
        assert_eq!(store.user().unwrap().id, "1");
    }

    #[tokio::test]
    async fn broadcasts_auth_changes() {
        let store = SessionStore::in_memory();
        let mut events = store.subscribe();

        store.sign_in("abc".into(), None, user("1")).unwrap();
        store.sign_out().unwrap();

        assert_eq!(events.recv().await.unwrap(), AuthChange::SignedIn(user("1")));
        assert_eq!(events.recv().await.unwrap(), AuthChange::SignedOut);
    }
}
