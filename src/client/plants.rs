use std::time::Duration;

use super::cache::{QueryCache, QueryFilter, QueryKey, QueryOptions};
use super::error::{ClientError, ClientResult};
use super::mutation::{append_item, temp_id, OptimisticUpdate};
use super::rest::RestClient;
use crate::models::{CreatePlantInput, Plant, UpdatePlantInput};

pub mod keys {
    use super::QueryKey;

    pub const ROOT: &str = "plants";

    pub fn user_plants(user_id: &str) -> QueryKey {
        QueryKey::from([ROOT, "user", user_id])
    }

    pub fn detail(plant_id: &str) -> QueryKey {
        QueryKey::from([ROOT, "detail", plant_id])
    }
}

/// Plant queries and mutations. Plant data is always refetched (no stale window).
#[derive(Debug, Clone)]
pub struct PlantsApi {
    rest: RestClient,
    cache: QueryCache,
}

impl PlantsApi {
    pub fn new(rest: RestClient, cache: QueryCache) -> Self {
        Self { rest, cache }
    }

    pub async fn user_plants(&self, user_id: &str) -> ClientResult<Option<Vec<Plant>>> {
        let url = self.rest.url(&["api", "plants", "users", user_id])?;
        self.cache
            .fetch(keys::user_plants(user_id), &QueryOptions::new(Duration::ZERO), || {
                self.rest.get(url.clone())
            })
            .await
    }

    pub async fn plant(&self, plant_id: &str) -> ClientResult<Option<Plant>> {
        let url = self.rest.url(&["api", "plants", plant_id])?;
        self.cache
            .fetch(keys::detail(plant_id), &QueryOptions::new(Duration::ZERO), || {
                self.rest.get(url.clone())
            })
            .await
    }

    /// Create a plant. A placeholder is appended to the owner's cached list
    /// until the server answers and removed again if it fails.
    pub async fn create(&self, input: &CreatePlantInput) -> ClientResult<Plant> {
        let placeholder = serde_json::to_value(input.to_placeholder(temp_id()))?;
        let mut optimistic = OptimisticUpdate::new(&self.cache);
        optimistic.apply(&keys::user_plants(&input.user_id), |old| append_item(old, placeholder));

        let url = self.rest.url(&["api", "plants"])?;
        let result = self
            .rest
            .post::<Plant, _>(url, input)
            .await
            .and_then(|plant| plant.ok_or(ClientError::EmptyBody));

        match &result {
            Ok(plant) => {
                optimistic.commit();
                self.cache.set_as(keys::detail(&plant.id), plant);
                tracing::info!(plant_id = %plant.id, "Plant created: {}", plant.name);
            }
            Err(err) => {
                optimistic.rollback();
                tracing::error!("Error creating plant: {}", err);
            }
        }

        self.cache.invalidate(&QueryFilter::root(keys::ROOT));
        result
    }

    pub async fn update(&self, plant_id: &str, input: &UpdatePlantInput) -> ClientResult<Plant> {
        let url = self.rest.url(&["api", "plants", plant_id])?;
        let result = self
            .rest
            .put::<Plant, _>(url, input)
            .await
            .and_then(|plant| plant.ok_or(ClientError::EmptyBody));

        match &result {
            Ok(plant) => self.cache.set_as(keys::detail(&plant.id), plant),
            Err(err) => tracing::error!("Error updating plant: {}", err),
        }

        self.cache.invalidate(&QueryFilter::root(keys::ROOT));
        result
    }

    pub async fn delete(&self, plant_id: &str) -> ClientResult<()> {
        let url = self.rest.url(&["api", "plants", plant_id])?;
        let result = self.rest.delete::<serde_json::Value>(url).await.map(|_| ());

        match &result {
            Ok(()) => {
                self.cache.remove(&keys::detail(plant_id));
            }
            Err(err) => tracing::error!("Error deleting plant: {}", err),
        }

        self.cache.invalidate(&QueryFilter::root(keys::ROOT));
        result
    }

    /// Raw plant photo bytes and their content type.
    pub async fn photo(&self, plant_id: &str) -> ClientResult<(Vec<u8>, String)> {
        let url = self.rest.url(&["api", "plants", plant_id, "photo"])?;
        super::image::fetch_image_bytes(&self.rest, url).await
    }

    pub async fn upload_photo(
        &self,
        plant_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
        mime: &str,
    ) -> ClientResult<Option<serde_json::Value>> {
        let url = self.rest.url(&["api", "plants", plant_id, "photo"])?;
        let result = self.rest.upload(url, file_name, bytes, mime).await;
        if result.is_ok() {
            self.cache.invalidate(&QueryFilter::Exact(keys::detail(plant_id)));
        }
        result
    }
}
