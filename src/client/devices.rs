use std::time::Duration;

use serde_json::{json, Value};

use super::cache::{QueryCache, QueryFilter, QueryKey, QueryOptions};
use super::error::{ClientError, ClientResult};
use super::mutation::{append_item, temp_id, OptimisticUpdate};
use super::rest::RestClient;
use crate::models::{CreateDeviceInput, Device, UpdateDeviceInput};

const LIST_STALE: Duration = Duration::from_secs(2 * 60);
const DETAIL_STALE: Duration = Duration::from_secs(5 * 60);

pub mod keys {
    use super::QueryKey;

    pub const ROOT: &str = "devices";

    pub fn list() -> QueryKey {
        QueryKey::from([ROOT, "list"])
    }

    pub fn plant(plant_id: &str) -> QueryKey {
        QueryKey::from([ROOT, "plant", plant_id])
    }

    pub fn detail(device_id: &str) -> QueryKey {
        QueryKey::from([ROOT, "detail", device_id])
    }
}

#[derive(Debug, Clone)]
pub struct DevicesApi {
    rest: RestClient,
    cache: QueryCache,
}

impl DevicesApi {
    pub fn new(rest: RestClient, cache: QueryCache) -> Self {
        Self { rest, cache }
    }

    pub async fn list(&self) -> ClientResult<Option<Vec<Device>>> {
        let url = self.rest.url(&["api", "devices"])?;
        self.cache
            .fetch(keys::list(), &QueryOptions::new(LIST_STALE), || self.rest.get(url.clone()))
            .await
    }

    pub async fn for_plant(&self, plant_id: &str) -> ClientResult<Option<Vec<Device>>> {
        let mut url = self.rest.url(&["api", "devices"])?;
        url.query_pairs_mut().append_pair("plant_id", plant_id);
        self.cache
            .fetch(keys::plant(plant_id), &QueryOptions::new(LIST_STALE), || self.rest.get(url.clone()))
            .await
    }

    pub async fn device(&self, device_id: &str) -> ClientResult<Option<Device>> {
        let url = self.rest.url(&["api", "devices", device_id])?;
        self.cache
            .fetch(keys::detail(device_id), &QueryOptions::new(DETAIL_STALE), || {
                self.rest.get(url.clone())
            })
            .await
    }

    pub async fn create(&self, input: &CreateDeviceInput) -> ClientResult<Device> {
        let placeholder = serde_json::to_value(input.to_placeholder(temp_id()))?;
        let mut optimistic = OptimisticUpdate::new(&self.cache);
        optimistic.apply(&keys::list(), |old| append_item(old, placeholder));

        let url = self.rest.url(&["api", "devices"])?;
        let result = self
            .rest
            .post::<Device, _>(url, input)
            .await
            .and_then(|device| device.ok_or(ClientError::EmptyBody));

        match &result {
            Ok(device) => {
                optimistic.commit();
                self.cache.set_as(keys::detail(&device.id), device);
            }
            Err(err) => {
                optimistic.rollback();
                tracing::error!("Error creating device: {}", err);
            }
        }

        self.invalidate_all();
        result
    }

    pub async fn update(&self, device_id: &str, input: &UpdateDeviceInput) -> ClientResult<Device> {
        let url = self.rest.url(&["api", "devices", device_id])?;
        let result = self
            .rest
            .put::<Device, _>(url, input)
            .await
            .and_then(|device| device.ok_or(ClientError::EmptyBody));

        if let Ok(device) = &result {
            self.cache.set_as(keys::detail(&device.id), device);
        }

        self.invalidate_all();
        result
    }

    /// Delete a device. A device that is already gone (404) counts as deleted.
    pub async fn delete(&self, device_id: &str) -> ClientResult<()> {
        let url = self.rest.url(&["api", "devices", device_id])?;
        let result = match self.rest.delete::<Value>(url).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => {
                tracing::debug!(device_id, "Device already deleted");
                Ok(())
            }
            Err(err) => Err(err),
        };

        if result.is_ok() {
            self.cache.remove(&keys::detail(device_id));
        }

        self.invalidate_all();
        result
    }

    pub async fn assign(&self, device_id: &str, plant_id: &str) -> ClientResult<Option<Value>> {
        let url = self.rest.url(&["api", "devices", device_id, "assign"])?;
        let result = self.rest.post(url, &json!({ "plant_id": plant_id })).await;
        self.invalidate_all();
        result
    }

    pub async fn unassign(&self, device_id: &str, plant_id: &str) -> ClientResult<Option<Value>> {
        let url = self.rest.url(&["api", "devices", device_id, "unassign"])?;
        let result = self.rest.post(url, &json!({ "plant_id": plant_id })).await;
        self.invalidate_all();
        result
    }

    fn invalidate_all(&self) {
        self.cache.invalidate(&QueryFilter::root(keys::ROOT));
    }
}
