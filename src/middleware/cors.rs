use axum::{
    http::{header, HeaderValue, Method},
    response::Response,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::SecurityConfig;

pub const GRAPHQL_ALLOW_ORIGIN: &str = "*";
pub const GRAPHQL_ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const GRAPHQL_ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// CORS for the REST proxy routes.
pub fn rest_cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_allow_all_origins {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Stamp the fixed GraphQL CORS headers on a response. Used as a
/// `map_response` layer so errors and preflights carry them too.
pub async fn graphql_cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(GRAPHQL_ALLOW_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(GRAPHQL_ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(GRAPHQL_ALLOW_HEADERS),
    );
    response
}
