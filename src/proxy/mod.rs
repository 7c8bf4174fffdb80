//! Outbound side of the BFF: one [`Upstream`] per downstream hop, plus the
//! helpers that turn downstream answers into responses for the browser.

pub mod relay;

use std::time::Duration;

use axum::{
    body::Bytes,
    http::{header, HeaderValue, Method},
    response::Response,
};
use serde_json::Value;
use url::Url;

use crate::error::ApiError;
use crate::middleware::Forwarded;

pub use relay::{error_from_response, relay_image, relay_json};

/// A downstream base URL bound to the shared HTTP client.
#[derive(Clone, Debug)]
pub struct Upstream {
    http: reqwest::Client,
    base_url: Url,
    timeout: Option<Duration>,
}

impl Upstream {
    pub fn new(http: reqwest::Client, base_url: &str, timeout: Option<Duration>) -> Result<Self, url::ParseError> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Same host, different outbound timeout.
    pub fn with_timeout(&self, timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }

    /// Join path segments onto the base URL. Each segment is percent-encoded
    /// on its own, so a path parameter can never add segments.
    pub fn url(&self, segments: &[&str], query: Option<&str>) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                tracing::error!("Upstream base URL cannot carry a path: {}", self.base_url);
                ApiError::internal()
            })?;
            path.pop_if_empty().extend(segments);
        }
        url.set_query(query.filter(|q| !q.is_empty()));
        Ok(url)
    }

    /// Start a request carrying the caller's Authorization header.
    pub fn request(&self, method: Method, url: Url, forwarded: &Forwarded) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, url);
        if let Some(auth) = &forwarded.authorization {
            builder = builder.header(header::AUTHORIZATION, auth.clone());
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }

    /// JSON in, JSON out: the contract shared by every resource route.
    pub async fn forward_json(
        &self,
        method: Method,
        segments: &[&str],
        forwarded: &Forwarded,
        body: Option<Value>,
    ) -> Result<Response, ApiError> {
        let url = self.url(segments, forwarded.query.as_deref())?;
        tracing::debug!(%method, %url, auth = forwarded.auth_flag(), "Forwarding to upstream");

        let mut request = self
            .request(method, url, forwarded)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        relay_json(response).await
    }

    /// Forward an opaque body (multipart uploads) with its original content type.
    pub async fn forward_raw(
        &self,
        method: Method,
        segments: &[&str],
        forwarded: &Forwarded,
        body: Bytes,
        content_type: Option<HeaderValue>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.url(segments, forwarded.query.as_deref())?;
        tracing::debug!(%method, %url, bytes = body.len(), "Forwarding raw body to upstream");

        let mut request = self.request(method, url, forwarded);
        if let Some(content_type) = content_type {
            request = request.header(header::CONTENT_TYPE, content_type);
        }
        Ok(request.body(body).send().await?)
    }

    /// GET an image resource.
    pub async fn fetch_image(&self, segments: &[&str], forwarded: &Forwarded) -> Result<reqwest::Response, ApiError> {
        let url = self.url(segments, forwarded.query.as_deref())?;
        Ok(self
            .request(Method::GET, url, forwarded)
            .header(header::ACCEPT, "image/*")
            .send()
            .await?)
    }
}

/// Parse a JSON request body. Invalid JSON is a local failure (500).
pub fn parse_json_body(body: &Bytes) -> Result<Value, ApiError> {
    Ok(serde_json::from_slice(body)?)
}

/// Like [`parse_json_body`] but an empty body forwards nothing.
pub fn parse_optional_json_body(body: &Bytes) -> Result<Option<Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    parse_json_body(body).map(Some)
}
