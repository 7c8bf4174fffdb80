// handlers/users/mod.rs - User routes (/api/users/*)

pub mod photo;
pub mod record;

pub use photo::{delete as photo_delete, get as photo_get, post as photo_post};
pub use record::{delete, show, update};
