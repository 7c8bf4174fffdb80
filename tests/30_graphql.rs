mod common;

use std::time::{Duration, Instant};

use anyhow::Result;
use axum::{
    http::{header, HeaderMap, StatusCode as AxumStatus},
    routing::post,
    Json, Router,
};
use common::{unreachable_url, MockUpstream, TestServer};
use reqwest::{Method, StatusCode};
use rootly_bff::config::AppConfig;
use serde_json::{json, Value};

fn graphql_backend() -> Router {
    Router::new().route(
        "/api/v1/graphql",
        post(|headers: HeaderMap, Json(body): Json<Value>| async move {
            if !headers.contains_key(header::AUTHORIZATION) {
                return (AxumStatus::UNAUTHORIZED, Json(json!({ "error": "Authentication required" })));
            }
            let query = body["query"].as_str().unwrap_or_default().to_string();
            (AxumStatus::OK, Json(json!({ "data": { "echo": query } })))
        })
        .get(|| async {
            (
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                "<html>playground</html>",
            )
        }),
    )
}

fn assert_cors(headers: &reqwest::header::HeaderMap) {
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
    assert_eq!(headers["access-control-allow-headers"], "Content-Type, Authorization");
}

#[tokio::test]
async fn preflight_succeeds_without_backend() -> Result<()> {
    let server = TestServer::single_upstream(&unreachable_url()?).await?;

    let res = reqwest::Client::new()
        .request(Method::OPTIONS, server.url("/api/graphql"))
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert_cors(res.headers());
    Ok(())
}

#[tokio::test]
async fn query_is_forwarded_with_authorization() -> Result<()> {
    let backend = MockUpstream::spawn(graphql_backend()).await?;
    let server = TestServer::single_upstream(&backend.base_url).await?;

    let res = reqwest::Client::new()
        .post(server.url("/api/graphql"))
        .header("Authorization", "Bearer abc")
        .json(&json!({ "query": "{ getSupportedMetrics }", "variables": {} }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert_cors(res.headers());
    assert_eq!(res.json::<Value>().await?, json!({ "data": { "echo": "{ getSupportedMetrics }" } }));
    assert_eq!(backend.hits()[0].authorization.as_deref(), Some("Bearer abc"));
    Ok(())
}

#[tokio::test]
async fn backend_rejection_is_relayed() -> Result<()> {
    let backend = MockUpstream::spawn(graphql_backend()).await?;
    let server = TestServer::single_upstream(&backend.base_url).await?;

    let res = reqwest::Client::new()
        .post(server.url("/api/graphql"))
        .json(&json!({ "query": "{ getSupportedMetrics }" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_cors(res.headers());
    let body: Value = res.json().await?;
    assert!(body["error"].as_str().unwrap().contains("Authentication required"));
    Ok(())
}

#[tokio::test]
async fn unreachable_backend_is_bad_gateway() -> Result<()> {
    let server = TestServer::single_upstream(&unreachable_url()?).await?;

    let res = reqwest::Client::new()
        .post(server.url("/api/graphql"))
        .json(&json!({ "query": "{ getSupportedMetrics }" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_cors(res.headers());
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Bad Gateway");
    assert!(body["message"].is_string());
    Ok(())
}

#[tokio::test]
async fn slow_backend_times_out_as_bad_gateway() -> Result<()> {
    let slow = Router::new().route(
        "/api/v1/graphql",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({ "data": {} }))
        }),
    );
    let backend = MockUpstream::spawn(slow).await?;
    let mut config = AppConfig::with_upstreams(&backend.base_url, &backend.base_url, &backend.base_url);
    config.upstream.graphql_timeout_secs = 1;
    let server = TestServer::spawn(config).await?;

    let started = Instant::now();
    let res = reqwest::Client::new()
        .post(server.url("/api/graphql"))
        .json(&json!({ "query": "{ getSupportedMetrics }" }))
        .send()
        .await?;

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_cors(res.headers());
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Bad Gateway");
    assert!(body["message"].is_string());
    assert_eq!(backend.hit_count(), 1);
    Ok(())
}

#[tokio::test]
async fn malformed_query_body_is_internal_error() -> Result<()> {
    let backend = MockUpstream::spawn(graphql_backend()).await?;
    let server = TestServer::single_upstream(&backend.base_url).await?;

    let res = reqwest::Client::new()
        .post(server.url("/api/graphql"))
        .header("Content-Type", "application/json")
        .body("{ query")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(res.headers());
    assert_eq!(res.json::<Value>().await?["error"], "Internal Server Error");
    assert_eq!(backend.hit_count(), 0);
    Ok(())
}

#[tokio::test]
async fn playground_html_is_relayed() -> Result<()> {
    let backend = MockUpstream::spawn(graphql_backend()).await?;
    let server = TestServer::single_upstream(&backend.base_url).await?;

    let res = reqwest::get(server.url("/api/graphql?tab=1")).await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/html");
    assert_eq!(res.text().await?, "<html>playground</html>");
    assert_eq!(backend.hits()[0].query.as_deref(), Some("tab=1"));
    Ok(())
}

#[tokio::test]
async fn playground_without_backend_is_graphql_error() -> Result<()> {
    let server = TestServer::single_upstream(&unreachable_url()?).await?;

    let res = reqwest::get(server.url("/api/graphql")).await?;

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(res.json::<Value>().await?["error"], "GraphQL Error");
    Ok(())
}
