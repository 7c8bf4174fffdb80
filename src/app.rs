//! Router assembly and server start-up.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    middleware::map_response,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::AppConfig;
use crate::handlers;
use crate::middleware::{graphql_cors_headers, rest_cors_layer};
use crate::proxy::Upstream;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared, immutable per-process state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Resource routes and session passthrough.
    pub upstream: Upstream,
    /// Login primary hop.
    pub gateway: Upstream,
    /// Login fallback hop.
    pub auth_service: Upstream,
    /// Plant photo retry hop.
    pub plants_service: Upstream,
    /// GraphQL proxy, bounded by the GraphQL timeout.
    pub graphql: Upstream,
    /// Gateway liveness probe.
    pub health: Upstream,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("failed to build HTTP client")?;

        let upstream_cfg = &config.upstream;
        let timeout = upstream_cfg.request_timeout_secs.map(Duration::from_secs);

        let upstream = Upstream::new(http.clone(), &upstream_cfg.base_url, timeout)
            .with_context(|| format!("invalid base URL: {}", upstream_cfg.base_url))?;
        let gateway = Upstream::new(http.clone(), &upstream_cfg.gateway_url, timeout)
            .with_context(|| format!("invalid gateway URL: {}", upstream_cfg.gateway_url))?;
        let auth_service = Upstream::new(http.clone(), &upstream_cfg.auth_service_url, timeout)
            .with_context(|| format!("invalid auth service URL: {}", upstream_cfg.auth_service_url))?;
        let plants_service = match &upstream_cfg.plants_service_url {
            Some(url) => Upstream::new(http, url, timeout)
                .with_context(|| format!("invalid plants service URL: {url}"))?,
            None => upstream.clone(),
        };
        let graphql = upstream.with_timeout(Some(Duration::from_secs(upstream_cfg.graphql_timeout_secs)));
        let health = upstream.with_timeout(Some(HEALTH_TIMEOUT));

        Ok(Self {
            config: Arc::new(config),
            upstream,
            gateway,
            auth_service,
            plants_service,
            graphql,
            health,
        })
    }
}

/// Build the full router for the given state.
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let rest = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/sensors", get(handlers::sensors))
        .merge(auth_routes())
        .merge(plant_routes())
        .merge(device_routes())
        .merge(user_routes())
        .layer(rest_cors_layer(&config.security));

    // GraphQL answers its own preflight and stamps fixed CORS headers
    let graphql = Router::new()
        .route(
            "/api/graphql",
            get(handlers::graphql::playground)
                .post(handlers::graphql::query)
                .options(handlers::graphql::preflight),
        )
        .layer(map_response(graphql_cors_headers));

    // Request lines go to INFO only when request logging is on
    let level = if config.api.enable_request_logging {
        Level::INFO
    } else {
        Level::DEBUG
    };
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(level))
        .on_response(DefaultOnResponse::new().level(level));

    rest.merge(graphql)
        .layer(
            ServiceBuilder::new()
                .layer(trace)
                .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes)),
        )
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/profile", get(auth::profile))
}

fn plant_routes() -> Router<AppState> {
    use handlers::plants;

    Router::new()
        .route("/api/plants", get(plants::list).post(plants::create))
        .route("/api/plants/users/:user_id", get(plants::list_for_user))
        .route(
            "/api/plants/:plant_id",
            get(plants::show).put(plants::update).delete(plants::delete),
        )
        .route(
            "/api/plants/:plant_id/photo",
            get(plants::photo_get).post(plants::photo_post),
        )
        .route("/api/plants/:plant_id/devices", get(plants::devices))
        .route(
            "/api/plants/:plant_id/devices/:device_id",
            post(plants::device_assign).delete(plants::device_remove),
        )
}

fn device_routes() -> Router<AppState> {
    use axum::routing::delete;
    use handlers::devices;

    Router::new()
        .route("/api/devices", get(devices::list).post(devices::create))
        .route(
            "/api/devices/:device_id",
            get(devices::show).put(devices::update).delete(devices::delete),
        )
        .route("/api/devices/:device_id/assign", post(devices::assign))
        .route("/api/devices/:device_id/unassign", post(devices::unassign))
        .route(
            "/api/devices/users/:user_id/devices/:device_id",
            delete(devices::delete_for_user),
        )
}

fn user_routes() -> Router<AppState> {
    use handlers::users;

    Router::new()
        .route(
            "/api/users/:user_id",
            get(users::show).put(users::update).delete(users::delete),
        )
        .route(
            "/api/users/:user_id/photo",
            get(users::photo_get).post(users::photo_post).delete(users::photo_delete),
        )
}

/// Bind and serve until the process is stopped. TLS material is read up
/// front so a missing certificate fails start-up instead of the first request.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let server = state.config.server.clone();
    let addr: SocketAddr = tokio::net::lookup_host((server.hostname.as_str(), server.port))
        .await
        .with_context(|| format!("invalid listen address {}:{}", server.hostname, server.port))?
        .next()
        .with_context(|| format!("no address for {}", server.hostname))?;
    let router = app(state);

    if server.enable_https {
        let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(&server.cert_path, &server.key_path)
            .await
            .with_context(|| {
                format!(
                    "failed to load TLS certificate {} / key {}",
                    server.cert_path.display(),
                    server.key_path.display()
                )
            })?;

        println!("🚀 Rootly BFF listening on https://{}", addr);
        axum_server::bind_rustls(addr, tls)
            .serve(router.into_make_service())
            .await
            .with_context(|| format!("failed to serve on {addr}"))?;
    } else {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;

        println!("🚀 Rootly BFF listening on http://{}", addr);
        axum::serve(listener, router)
            .await
            .context("server error")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use tower::ServiceExt;

    // Nothing listens on the discard port, so no test here reaches an upstream.
    fn offline_state(configure: impl FnOnce(&mut AppConfig)) -> AppState {
        let offline = "http://127.0.0.1:9";
        let mut config = AppConfig::with_upstreams(offline, offline, offline);
        config.server.hostname = "127.0.0.1".to_string();
        configure(&mut config);
        AppState::new(config).unwrap()
    }

    fn router() -> Router {
        app(offline_state(|config| {
            config.security.cors_allow_all_origins = false;
            config.security.cors_origins = vec!["http://localhost:3000".to_string()];
        }))
    }

    #[tokio::test]
    async fn serve_fails_without_tls_material() {
        let state = offline_state(|config| {
            config.server.port = 0;
            config.server.enable_https = true;
            config.server.cert_path = "/nonexistent/rootly.crt".into();
            config.server.key_path = "/nonexistent/rootly.key".into();
        });

        let err = tokio::time::timeout(Duration::from_secs(5), serve(state))
            .await
            .expect("serve should fail fast")
            .unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/rootly.crt"));
    }

    #[tokio::test]
    async fn serve_fails_when_port_is_taken() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();
        let state = offline_state(|config| config.server.port = port);

        let err = tokio::time::timeout(Duration::from_secs(5), serve(state))
            .await
            .expect("serve should fail fast")
            .unwrap_err();
        assert!(format!("{err:#}").contains(&format!("failed to bind 127.0.0.1:{port}")));
    }

    #[tokio::test]
    async fn graphql_preflight_is_answered_locally() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/graphql")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, OPTIONS");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type, Authorization");
    }

    #[tokio::test]
    async fn rest_routes_allow_configured_origins_only() {
        let request = |origin: &str| {
            Request::builder()
                .uri("/api/sensors")
                .header(header::ORIGIN, origin)
                .body(Body::empty())
                .unwrap()
        };

        let allowed = router().oneshot(request("http://localhost:3000")).await.unwrap();
        assert_eq!(allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");

        let denied = router().oneshot(request("http://evil.example")).await.unwrap();
        assert!(denied.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn missing_credentials_never_leave_the_process() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email":"ana@rootly.dev"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"error":"Email and password are required"}"#);
    }

    #[tokio::test]
    async fn oversized_bodies_are_rejected() {
        let offline = "http://127.0.0.1:9";
        let mut config = AppConfig::with_upstreams(offline, offline, offline);
        config.api.max_request_size_bytes = 16;
        let router = app(AppState::new(config).unwrap());

        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/plants")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(vec![b' '; 64]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
