use reqwest::{header, multipart, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use url::Url;

use super::error::{ClientError, ClientResult};
use super::session::SessionStore;

/// JSON client for the BFF's REST routes. Every request carries the session's
/// bearer token when there is one.
#[derive(Debug, Clone)]
pub struct RestClient {
    base_url: Url,
    http: reqwest::Client,
    session: SessionStore,
}

impl RestClient {
    pub fn new(base_url: &str, http: reqwest::Client, session: SessionStore) -> ClientResult<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            http,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Base URL plus encoded path segments.
    pub fn url(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Attach the bearer token, if signed in.
    pub fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.access_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        let response = self.send(Method::GET, url, None).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn post<T, B>(&self, url: Url, body: &B) -> ClientResult<Option<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.send(Method::POST, url, Some(serde_json::to_value(body)?)).await?;
        decode_optional(response).await
    }

    pub async fn put<T, B>(&self, url: Url, body: &B) -> ClientResult<Option<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.send(Method::PUT, url, Some(serde_json::to_value(body)?)).await?;
        decode_optional(response).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, url: Url) -> ClientResult<Option<T>> {
        let response = self.send(Method::DELETE, url, None).await?;
        decode_optional(response).await
    }

    /// Multipart upload with a single `file` field.
    pub async fn upload(&self, url: Url, file_name: &str, bytes: Vec<u8>, mime: &str) -> ClientResult<Option<Value>> {
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = multipart::Form::new().part("file", part);

        let request = self.authorize(self.http.post(url.clone())).multipart(form);
        let response = request.send().await?;
        let response = check(Method::POST, &url, response).await?;
        decode_optional(response).await
    }

    async fn send(&self, method: Method, url: Url, body: Option<Value>) -> ClientResult<reqwest::Response> {
        tracing::debug!(%method, %url, "Sending request");

        let mut request = self
            .authorize(self.http.request(method.clone(), url.clone()))
            .header(header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        check(method, &url, response).await
    }
}

async fn check(method: Method, url: &Url, response: reqwest::Response) -> ClientResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let err = ClientError::from_response(response).await;
    // A 404 on delete means the resource is already gone
    if method == Method::DELETE && err.is_not_found() {
        tracing::debug!(%url, "DELETE target not found");
    } else {
        tracing::warn!(%method, %url, "Request failed: {}", err);
    }
    Err(err)
}

/// 204, `Content-Length: 0` and empty bodies decode to `None`.
async fn decode_optional<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<Option<T>> {
    if response.status() == StatusCode::NO_CONTENT || response.content_length() == Some(0) {
        return Ok(None);
    }
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(&bytes)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_each_segment() {
        let client = RestClient::new(
            "https://localhost:3001/",
            reqwest::Client::new(),
            SessionStore::in_memory(),
        )
        .unwrap();

        let url = client.url(&["api", "plants", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "https://localhost:3001/api/plants/a%20b%2Fc");
    }
}
