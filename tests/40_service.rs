mod common;

use anyhow::Result;
use axum::{http::StatusCode as AxumStatus, routing::get, Router};
use common::{unreachable_url, MockUpstream, TestServer};
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn root_describes_the_service() -> Result<()> {
    let server = TestServer::single_upstream(&unreachable_url()?).await?;

    let body: Value = reqwest::get(server.url("/")).await?.json().await?;

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Rootly BFF");
    assert_eq!(body["data"]["endpoints"]["graphql"], "/api/graphql");
    Ok(())
}

#[tokio::test]
async fn health_is_ok_when_gateway_answers() -> Result<()> {
    // any HTTP answer counts, even an error status
    let gateway = MockUpstream::spawn(Router::new().route("/health", get(|| async { (AxumStatus::SERVICE_UNAVAILABLE, "down for maintenance") }))).await?;
    let server = TestServer::single_upstream(&gateway.base_url).await?;

    let res = reqwest::get(server.url("/health")).await?;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["gateway"], "ok");
    assert_eq!(gateway.hits()[0].path, "/health");
    Ok(())
}

#[tokio::test]
async fn health_degrades_when_gateway_is_unreachable() -> Result<()> {
    let server = TestServer::single_upstream(&unreachable_url()?).await?;

    let res = reqwest::get(server.url("/health")).await?;

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["gateway"], "unreachable");
    Ok(())
}

#[tokio::test]
async fn sensors_default_to_active() -> Result<()> {
    let server = TestServer::single_upstream(&unreachable_url()?).await?;

    let sensors: Value = reqwest::get(server.url("/api/sensors")).await?.json().await?;
    assert_eq!(sensors[0]["id"], "sensor-1");
    assert_eq!(sensors[0]["type"], "humidity");
    assert_eq!(sensors[0]["status"], "active");
    assert!(sensors[0]["installedAt"].is_string());

    let filtered: Value = reqwest::get(server.url("/api/sensors?status=inactive")).await?.json().await?;
    assert_eq!(filtered[0]["status"], "inactive");
    Ok(())
}

#[tokio::test]
async fn sensors_take_first_repeated_status() -> Result<()> {
    let server = TestServer::single_upstream(&unreachable_url()?).await?;

    let res = reqwest::get(server.url("/api/sensors?status=maintenance&status=inactive")).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let sensors: Value = res.json().await?;
    assert_eq!(sensors[0]["status"], "maintenance");
    Ok(())
}
