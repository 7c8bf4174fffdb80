#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::{extract::Request, middleware::Next, Router};
use rootly_bff::{app, AppConfig, AppState};
use tokio::net::TcpListener;

/// One request seen by a mock upstream.
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
}

/// A downstream service stub listening on an ephemeral port.
pub struct MockUpstream {
    pub base_url: String,
    hits: Arc<Mutex<Vec<Hit>>>,
}

impl MockUpstream {
    pub async fn spawn(router: Router) -> Result<Self> {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let recorder = hits.clone();

        let router = router.layer(axum::middleware::from_fn(move |req: Request, next: Next| {
            let recorder = recorder.clone();
            async move {
                let hit = Hit {
                    method: req.method().to_string(),
                    path: req.uri().path().to_string(),
                    query: req.uri().query().map(str::to_string),
                    authorization: req
                        .headers()
                        .get("authorization")
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_string),
                };
                recorder.lock().unwrap().push(hit);
                next.run(req).await
            }
        }));

        let base_url = serve(router).await?;
        Ok(Self { base_url, hits })
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().unwrap().clone()
    }

    pub fn hit_count(&self) -> usize {
        self.hits.lock().unwrap().len()
    }
}

/// A URL on a free port nobody listens on.
pub fn unreachable_url() -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    Ok(format!("http://127.0.0.1:{}", port))
}

async fn serve(router: Router) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind test listener")?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://{}", addr))
}

/// The BFF itself, served in-process.
pub struct TestServer {
    pub base_url: String,
}

impl TestServer {
    pub async fn spawn(config: AppConfig) -> Result<Self> {
        let state = AppState::new(config)?;
        let base_url = serve(app(state)).await?;
        Ok(Self { base_url })
    }

    /// Base URL, gateway and auth service all on the same upstream.
    pub async fn single_upstream(upstream: &str) -> Result<Self> {
        Self::spawn(AppConfig::with_upstreams(upstream, upstream, upstream)).await
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
