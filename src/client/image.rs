//! Authenticated image loading. Photo routes need the bearer token, so images
//! are fetched here and handed out as local `blob:` references that are
//! released when their owner drops them.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use reqwest::header;
use tokio::sync::watch;
use url::Url;
use uuid::Uuid;

use super::error::{ClientError, ClientResult};
use super::rest::RestClient;

const OBJECT_URL_PREFIX: &str = "blob:rootly/";
const DEFAULT_IMAGE_TYPE: &str = "image/jpeg";

/// GET an image with the session token, bypassing every cache on the way.
pub async fn fetch_image_bytes(rest: &RestClient, mut url: Url) -> ClientResult<(Vec<u8>, String)> {
    url.query_pairs_mut()
        .append_pair("_t", &Utc::now().timestamp_millis().to_string());

    let response = rest
        .authorize(rest.http().get(url))
        .header(header::ACCEPT, "image/*")
        .header(header::CACHE_CONTROL, "no-cache")
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ClientError::from_response(response).await);
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_IMAGE_TYPE)
        .to_string();
    let bytes = response.bytes().await?;
    Ok((bytes.to_vec(), content_type))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Live `blob:` references and the bytes behind them.
#[derive(Debug, Clone, Default)]
pub struct ObjectUrlRegistry {
    blobs: Arc<Mutex<HashMap<String, ImageBlob>>>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, bytes: Vec<u8>, content_type: String) -> ObjectUrl {
        let url = format!("{}{}", OBJECT_URL_PREFIX, Uuid::new_v4());
        self.lock().insert(url.clone(), ImageBlob { bytes, content_type });
        tracing::trace!(%url, "Object URL created");
        ObjectUrl {
            url,
            registry: self.clone(),
        }
    }

    pub fn resolve(&self, url: &str) -> Option<ImageBlob> {
        self.lock().get(url).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns whether the reference was still live.
    pub fn revoke(&self, url: &str) -> bool {
        let revoked = self.lock().remove(url).is_some();
        if revoked {
            tracing::trace!(%url, "Object URL revoked");
        }
        revoked
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ImageBlob>> {
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An owned `blob:` reference, revoked exactly once when dropped.
pub struct ObjectUrl {
    url: String,
    registry: ObjectUrlRegistry,
}

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn blob(&self) -> Option<ImageBlob> {
        self.registry.resolve(&self.url)
    }
}

impl fmt::Debug for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectUrl").field(&self.url).finish()
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.registry.revoke(&self.url);
    }
}

#[derive(Debug)]
pub enum ImageSource {
    Object(ObjectUrl),
    Fallback(String),
    Unavailable,
}

impl ImageSource {
    /// What an `<img src>` would get; `None` when there is nothing to show.
    pub fn src(&self) -> Option<&str> {
        match self {
            ImageSource::Object(url) => Some(url.as_str()),
            ImageSource::Fallback(url) => Some(url),
            ImageSource::Unavailable => None,
        }
    }
}

/// Holds the image currently on display. Replacing or clearing it releases
/// the previous object reference.
#[derive(Debug, Default)]
pub struct ImageSlot {
    current: Option<ImageSource>,
}

impl ImageSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, source: ImageSource) {
        self.current = Some(source);
    }

    pub fn current(&self) -> Option<&ImageSource> {
        self.current.as_ref()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[derive(Debug, Clone)]
pub struct ImageLoader {
    rest: RestClient,
    registry: ObjectUrlRegistry,
}

impl ImageLoader {
    pub fn new(rest: RestClient, registry: ObjectUrlRegistry) -> Self {
        Self { rest, registry }
    }

    pub fn registry(&self) -> &ObjectUrlRegistry {
        &self.registry
    }

    /// Fetch `src` (absolute, or relative to the BFF) into an object URL. Any
    /// failure degrades to the fallback; a missing photo is not worth a warning.
    pub async fn load(&self, src: &str, fallback: Option<&str>) -> ImageSource {
        let result = match self.rest.base_url().join(src) {
            Ok(url) => fetch_image_bytes(&self.rest, url).await,
            Err(err) => Err(err.into()),
        };

        match result {
            Ok((bytes, content_type)) => ImageSource::Object(self.registry.create(bytes, content_type)),
            Err(err) => {
                if err.is_not_found() {
                    tracing::debug!(%src, "No image at source");
                } else {
                    tracing::warn!(%src, "Image load failed: {}", err);
                }
                match fallback {
                    Some(fallback) => ImageSource::Fallback(fallback.to_string()),
                    None => ImageSource::Unavailable,
                }
            }
        }
    }

    /// Defer [`ImageLoader::load`] until `visible` turns true. `None` when the
    /// sender goes away first.
    pub async fn load_when_visible(
        &self,
        src: &str,
        fallback: Option<&str>,
        mut visible: watch::Receiver<bool>,
    ) -> Option<ImageSource> {
        visible.wait_for(|visible| *visible).await.ok()?;
        Some(self.load(src, fallback).await)
    }
}
