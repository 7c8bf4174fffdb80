use std::time::Duration;

use serde_json::{json, Value};

use super::cache::{QueryCache, QueryFilter, QueryKey, QueryOptions};
use super::devices::keys as device_keys;
use super::error::ClientResult;
use super::rest::RestClient;
use crate::models::Device;

const STALE: Duration = Duration::from_secs(2 * 60);

pub mod keys {
    use super::QueryKey;

    pub const ROOT: &str = "plantDevices";

    pub fn by_plant(plant_id: &str) -> QueryKey {
        QueryKey::from([ROOT, "plant", plant_id])
    }
}

/// Device assignment seen from the plant side.
#[derive(Debug, Clone)]
pub struct PlantDevicesApi {
    rest: RestClient,
    cache: QueryCache,
}

impl PlantDevicesApi {
    pub fn new(rest: RestClient, cache: QueryCache) -> Self {
        Self { rest, cache }
    }

    pub async fn by_plant(&self, plant_id: &str) -> ClientResult<Option<Vec<Device>>> {
        let url = self.rest.url(&["api", "plants", plant_id, "devices"])?;
        self.cache
            .fetch(keys::by_plant(plant_id), &QueryOptions::new(STALE), || self.rest.get(url.clone()))
            .await
    }

    pub async fn assign(&self, plant_id: &str, device_id: &str) -> ClientResult<Option<Value>> {
        let url = self.rest.url(&["api", "plants", plant_id, "devices", device_id])?;
        let result = self.rest.post(url, &json!({})).await;
        if result.is_ok() {
            self.invalidate(plant_id);
        }
        result
    }

    pub async fn remove(&self, plant_id: &str, device_id: &str) -> ClientResult<Option<Value>> {
        let url = self.rest.url(&["api", "plants", plant_id, "devices", device_id])?;
        let result = self.rest.delete(url).await;
        if result.is_ok() {
            self.invalidate(plant_id);
        }
        result
    }

    fn invalidate(&self, plant_id: &str) {
        self.cache.invalidate(&QueryFilter::Exact(keys::by_plant(plant_id)));
        self.cache.invalidate(&QueryFilter::root(device_keys::ROOT));
    }
}
