pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod proxy;

pub use app::{app, AppState};
pub use config::AppConfig;
pub use error::ApiError;
