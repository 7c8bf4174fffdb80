pub mod cors;
pub mod forwarded;

pub use cors::{graphql_cors_headers, rest_cors_layer};
pub use forwarded::{extract_authorization, Forwarded};
