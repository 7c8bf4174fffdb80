//! Pass-through DTOs owned by the downstream services.
//!
//! Nothing here is validated beyond deserialisation; unknown fields are
//! ignored and absent optional fields are left out when re-serialised.

pub mod analytics;
pub mod device;
pub mod plant;
pub mod sensor;
pub mod user;

pub use analytics::*;
pub use device::{CreateDeviceInput, Device, DeviceCategory, UpdateDeviceInput};
pub use plant::{CreatePlantInput, Plant, UpdatePlantInput};
pub use sensor::{Sensor, SensorLocation};
pub use user::{RegisterUserInput, UpdateUserInput, User};

use serde::{Deserialize, Deserializer};

/// Identifiers arrive as strings from some services and as numbers from
/// others; both are kept as strings.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

pub(crate) fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "string_or_number")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
}
