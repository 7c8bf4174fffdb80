use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
};
use std::convert::Infallible;

/// The parts of an inbound request that are passed through to the upstream:
/// the caller's `Authorization` header and the raw query string.
#[derive(Clone, Debug, Default)]
pub struct Forwarded {
    pub authorization: Option<HeaderValue>,
    pub query: Option<String>,
}

impl Forwarded {
    pub fn has_auth(&self) -> bool {
        self.authorization.is_some()
    }

    /// "YES"/"NO" for log lines; the token itself is never logged.
    pub fn auth_flag(&self) -> &'static str {
        if self.has_auth() {
            "YES"
        } else {
            "NO"
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Forwarded
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            authorization: extract_authorization(&parts.headers),
            query: parts
                .uri
                .query()
                .filter(|q| !q.is_empty())
                .map(str::to_string),
        })
    }
}

/// Extract the Authorization header verbatim. Validation belongs to the
/// downstream services, so an empty header counts as absent and nothing else
/// is checked.
pub fn extract_authorization(headers: &HeaderMap) -> Option<HeaderValue> {
    headers
        .get(header::AUTHORIZATION)
        .filter(|value| !value.as_bytes().iter().all(u8::is_ascii_whitespace))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn forwarded_for(request: Request<()>) -> Forwarded {
        let (mut parts, _) = request.into_parts();
        Forwarded::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn captures_authorization_and_query() {
        let request = Request::builder()
            .uri("/api/plants?user_id=7&limit=5")
            .header("Authorization", "Bearer abc")
            .body(())
            .unwrap();

        let forwarded = forwarded_for(request).await;
        assert_eq!(forwarded.authorization.unwrap(), "Bearer abc");
        assert_eq!(forwarded.query.as_deref(), Some("user_id=7&limit=5"));
    }

    #[tokio::test]
    async fn missing_parts_are_none() {
        let request = Request::builder()
            .uri("/api/plants")
            .header("Authorization", "  ")
            .body(())
            .unwrap();

        let forwarded = forwarded_for(request).await;
        assert!(forwarded.authorization.is_none());
        assert!(forwarded.query.is_none());
        assert_eq!(forwarded.auth_flag(), "NO");
    }
}
