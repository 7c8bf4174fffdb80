// handlers/plants/mod.rs - Plant routes (/api/plants/*)

pub mod collection;
pub mod devices;
pub mod photo;
pub mod record;

pub use collection::{create, list, list_for_user};
pub use devices::{assign as device_assign, list as devices, remove as device_remove};
pub use photo::{get as photo_get, post as photo_post};
pub use record::{delete, show, update};
