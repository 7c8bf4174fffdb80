pub mod analytics;
pub mod auth;
pub mod devices;
pub mod plants;
pub mod users;
