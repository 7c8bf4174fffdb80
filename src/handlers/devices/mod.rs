// handlers/devices/mod.rs - Device routes (/api/devices/*)

pub mod collection;
pub mod record;

pub use collection::{create, delete_for_user, list};
pub use record::{assign, delete, show, unassign, update};
