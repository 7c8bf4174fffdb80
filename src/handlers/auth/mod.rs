// handlers/auth/mod.rs - Authentication routes (/api/auth/*)
//
// Login runs its own two-hop chain; the remaining session operations are
// plain passthrough to the gateway.

pub mod login;
pub mod session;

pub use login::post as login;
pub use session::{logout, profile, refresh, register};
