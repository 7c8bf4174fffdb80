use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Test,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub hostname: String,
    pub port: u16,
    pub enable_https: bool,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Where the proxy routes send traffic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Resource and GraphQL routes (`BASE_URL`, then `API_GATEWAY_URL`).
    pub base_url: String,
    /// First hop of the login chain.
    pub gateway_url: String,
    /// Second hop of the login chain.
    pub auth_service_url: String,
    /// Retry hop for plant photos; the base URL is reused when unset.
    pub plants_service_url: Option<String>,
    pub graphql_timeout_secs: u64,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_allow_all_origins: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_GATEWAY_URL: &str = "http://api-gateway:8080";
const DEFAULT_AUTH_SERVICE_URL: &str = "http://reverse_proxy:80";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("NODE_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("test") => Environment::Test,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Test => Self::test(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("HOSTNAME") {
            if !v.trim().is_empty() {
                self.server.hostname = v;
            }
        }
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("ENABLE_HTTPS") {
            self.server.enable_https = !v.trim().eq_ignore_ascii_case("false");
        }
        if let Ok(v) = env::var("SSL_CERT_PATH") {
            self.server.cert_path = PathBuf::from(v);
        }
        if let Ok(v) = env::var("SSL_KEY_PATH") {
            self.server.key_path = PathBuf::from(v);
        }

        // Upstream overrides
        let base_url = non_empty_var("BASE_URL");
        let gateway_url = non_empty_var("API_GATEWAY_URL");
        if let Some(v) = base_url.clone().or_else(|| gateway_url.clone()) {
            self.upstream.base_url = v;
        }
        if let Some(v) = gateway_url {
            self.upstream.gateway_url = v;
        }
        if let Some(v) = non_empty_var("AUTH_SERVICE_URL") {
            self.upstream.auth_service_url = v;
        }
        if let Some(v) = non_empty_var("PLANTS_SERVICE_URL") {
            self.upstream.plants_service_url = Some(v);
        }
        if let Ok(v) = env::var("GRAPHQL_TIMEOUT_SECS") {
            self.upstream.graphql_timeout_secs = v.parse().unwrap_or(self.upstream.graphql_timeout_secs);
        }
        if let Ok(v) = env::var("UPSTREAM_TIMEOUT_SECS") {
            if let Ok(secs) = v.trim().parse() {
                self.upstream.request_timeout_secs = Some(secs);
            }
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = parse_flag(&v).unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("CORS_ALLOW_ALL_ORIGINS") {
            self.security.cors_allow_all_origins = parse_flag(&v).unwrap_or(self.security.cors_allow_all_origins);
        }
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(v) = non_empty_var("LOG_LEVEL") {
            self.logging.level = v;
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                cors_allow_all_origins: true,
                cors_origins: default_cors_origins(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    pub fn test() -> Self {
        Self {
            environment: Environment::Test,
            server: ServerConfig {
                enable_https: false,
                ..ServerConfig::default()
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
            },
            ..Self::development()
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                cors_allow_all_origins: false,
                cors_origins: default_cors_origins(),
            },
            logging: LoggingConfig {
                level: "warn".to_string(),
            },
        }
    }

    /// Config pointing every hop at explicit URLs, with TLS off.
    pub fn with_upstreams(base_url: &str, gateway_url: &str, auth_service_url: &str) -> Self {
        let mut config = Self::test();
        config.upstream.base_url = base_url.to_string();
        config.upstream.gateway_url = gateway_url.to_string();
        config.upstream.auth_service_url = auth_service_url.to_string();
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// `tracing` filter used when `RUST_LOG` is absent.
    pub fn log_filter(&self) -> String {
        let app_name = env!("CARGO_PKG_NAME").replace('-', "_");
        let level = self.logging.level.as_str();
        format!("{app_name}={level},tower_http={level}")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: "0.0.0.0".to_string(),
            port: 3001,
            enable_https: true,
            cert_path: PathBuf::from("certs/localhost.crt"),
            key_path: PathBuf::from("certs/localhost.key"),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            auth_service_url: DEFAULT_AUTH_SERVICE_URL.to_string(),
            plants_service_url: None,
            graphql_timeout_secs: 30,
            request_timeout_secs: None,
        }
    }
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string(), "http://localhost:3001".to_string()]
}

/// Lenient boolean: `true/1/yes/on` and `false/0/no/off`, any case.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
