//! Typed SDK for the BFF: the Rust counterpart of the browser hooks. One
//! [`RootlyClient`] shares a session, a query cache and a connection pool
//! across every resource API.

pub mod analytics;
pub mod auth;
pub mod cache;
pub mod devices;
pub mod error;
pub mod graphql;
pub mod image;
pub mod mutation;
pub mod plant_devices;
pub mod plants;
pub mod rest;
pub mod retry;
pub mod session;
pub mod users;

pub use analytics::AnalyticsApi;
pub use auth::{AuthApi, LoginResponse, RefreshResponse};
pub use cache::{QueryCache, QueryFilter, QueryKey, QueryOptions};
pub use devices::DevicesApi;
pub use error::{ClientError, ClientResult};
pub use graphql::GraphQlClient;
pub use image::{ImageLoader, ImageSlot, ImageSource, ObjectUrl, ObjectUrlRegistry};
pub use mutation::OptimisticUpdate;
pub use plant_devices::PlantDevicesApi;
pub use plants::PlantsApi;
pub use rest::RestClient;
pub use retry::RetryPolicy;
pub use session::{AuthChange, SessionData, SessionStore};
pub use users::UsersApi;

const USER_AGENT: &str = concat!("rootly/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct RootlyClient {
    rest: RestClient,
    cache: QueryCache,
    images: ObjectUrlRegistry,
}

impl RootlyClient {
    /// `insecure_tls` accepts self-signed certificates, for a BFF started
    /// with its development HTTPS setup.
    pub fn new(base_url: &str, insecure_tls: bool, session: SessionStore) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(insecure_tls)
            .build()?;
        Self::with_http(base_url, http, session)
    }

    pub fn with_http(base_url: &str, http: reqwest::Client, session: SessionStore) -> ClientResult<Self> {
        Ok(Self {
            rest: RestClient::new(base_url, http, session)?,
            cache: QueryCache::new(),
            images: ObjectUrlRegistry::new(),
        })
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub fn session(&self) -> &SessionStore {
        self.rest.session()
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn plants(&self) -> PlantsApi {
        PlantsApi::new(self.rest.clone(), self.cache.clone())
    }

    pub fn devices(&self) -> DevicesApi {
        DevicesApi::new(self.rest.clone(), self.cache.clone())
    }

    pub fn plant_devices(&self) -> PlantDevicesApi {
        PlantDevicesApi::new(self.rest.clone(), self.cache.clone())
    }

    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.rest.clone(), self.cache.clone())
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.rest.clone(), self.cache.clone())
    }

    pub fn graphql(&self) -> GraphQlClient {
        GraphQlClient::new(self.rest.clone())
    }

    pub fn analytics(&self) -> AnalyticsApi {
        AnalyticsApi::new(self.graphql(), self.cache.clone())
    }

    pub fn images(&self) -> ImageLoader {
        ImageLoader::new(self.rest.clone(), self.images.clone())
    }
}
