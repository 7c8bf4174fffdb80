// handlers/mod.rs - Route handlers
//
// Every handler is a thin proxy: it extracts path parameters, the caller's
// Authorization header and query string, and hands them to an `Upstream`.
// The BFF itself holds no data apart from the mock sensor list.

pub mod auth;
pub mod devices;
pub mod graphql;
pub mod plants;
pub mod root;
pub mod sensors;
pub mod users;

pub use root::{health, root};
pub use sensors::get as sensors;

/// `/api/v1/<rest...>` as path segments.
pub(crate) fn v1<'a>(rest: &[&'a str]) -> Vec<&'a str> {
    let mut segments = Vec::with_capacity(rest.len() + 2);
    segments.extend(["api", "v1"]);
    segments.extend_from_slice(rest);
    segments
}
