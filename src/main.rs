use tracing_subscriber::EnvFilter;

use rootly_bff::{app, config};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up BASE_URL, API_GATEWAY_URL, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting Rootly BFF in {:?} mode", config.environment);
    tracing::info!(
        base_url = %config.upstream.base_url,
        gateway_url = %config.upstream.gateway_url,
        auth_service_url = %config.upstream.auth_service_url,
        https = config.server.enable_https,
        "Upstreams configured"
    );
    if config.is_production() && !config.server.enable_https {
        tracing::warn!("HTTPS is disabled in production");
    }

    let result = match app::AppState::new(config.clone()) {
        Ok(state) => app::serve(state).await,
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        tracing::error!("{:#}", err);
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
