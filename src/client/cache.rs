//! In-process query cache keyed by ordered string segments.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::error::ClientResult;
use super::retry::RetryPolicy;

/// Ordered key segments; the first segment is the root (`plants`, `devices`…).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn root(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// A query keyed on an empty id is disabled.
    pub fn is_enabled(&self) -> bool {
        self.0.iter().all(|segment| !segment.is_empty())
    }
}

impl<const N: usize> From<[&str; N]> for QueryKey {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Selects cache entries for invalidation or removal.
#[derive(Debug, Clone)]
pub enum QueryFilter {
    Exact(QueryKey),
    Prefix(QueryKey),
    Root(String),
}

impl QueryFilter {
    pub fn root(root: impl Into<String>) -> Self {
        QueryFilter::Root(root.into())
    }

    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            QueryFilter::Exact(exact) => key == exact,
            QueryFilter::Prefix(prefix) => key.starts_with(prefix),
            QueryFilter::Root(root) => key.root() == Some(root.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    pub stale_time: Duration,
    pub retry: RetryPolicy,
    pub enabled: bool,
}

impl QueryOptions {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            stale_time,
            retry: RetryPolicy::query_default(),
            enabled: true,
        }
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Value,
    updated_at: Instant,
    invalidated: bool,
}

impl CacheEntry {
    fn new(data: Value) -> Self {
        Self {
            data,
            updated_at: Instant::now(),
            invalidated: false,
        }
    }

    fn is_fresh(&self, stale_time: Duration) -> bool {
        !self.invalidated && self.updated_at.elapsed() < stale_time
    }
}

/// Shared cache handle. Clones see the same entries.
#[derive(Debug, Clone, Default)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<QueryKey, CacheEntry>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &QueryKey) -> Option<Value> {
        self.read(|entries| entries.get(key).map(|entry| entry.data.clone()))
    }

    pub fn set(&self, key: QueryKey, data: Value) {
        self.write(|entries| {
            entries.insert(key, CacheEntry::new(data));
        });
    }

    /// Typed write, used to seed entries from mutation results.
    pub fn set_as<T: Serialize>(&self, key: QueryKey, data: &T) {
        match serde_json::to_value(data) {
            Ok(data) => self.set(key, data),
            Err(err) => tracing::warn!(%key, "Not caching unserialisable value: {}", err),
        }
    }

    /// Replace an entry with `f(current)`; `None` removes it.
    pub fn update<F>(&self, key: &QueryKey, f: F) -> Option<Value>
    where
        F: FnOnce(Option<Value>) -> Option<Value>,
    {
        self.write(|entries| {
            let current = entries.get(key).map(|entry| entry.data.clone());
            match f(current) {
                Some(data) => {
                    entries.insert(key.clone(), CacheEntry::new(data.clone()));
                    Some(data)
                }
                None => {
                    entries.remove(key);
                    None
                }
            }
        })
    }

    pub fn remove(&self, key: &QueryKey) -> Option<Value> {
        self.write(|entries| entries.remove(key).map(|entry| entry.data))
    }

    /// Mark matching entries stale; the next fetch goes to the network.
    pub fn invalidate(&self, filter: &QueryFilter) -> usize {
        self.write(|entries| {
            let mut count = 0;
            for (key, entry) in entries.iter_mut() {
                if filter.matches(key) {
                    entry.invalidated = true;
                    count += 1;
                }
            }
            tracing::debug!(?filter, count, "Invalidated queries");
            count
        })
    }

    pub fn is_invalidated(&self, key: &QueryKey) -> bool {
        self.read(|entries| entries.get(key).is_some_and(|entry| entry.invalidated))
    }

    pub fn clear(&self) {
        self.write(|entries| entries.clear());
    }

    /// Copy of every entry matching `filter`, for later restore.
    pub fn snapshot(&self, filter: &QueryFilter) -> Vec<(QueryKey, Value)> {
        self.read(|entries| {
            entries
                .iter()
                .filter(|(key, _)| filter.matches(key))
                .map(|(key, entry)| (key.clone(), entry.data.clone()))
                .collect()
        })
    }

    /// Serve fresh cached data, otherwise run `fetcher` under the query's
    /// retry policy and cache the result. Disabled queries return `None`
    /// without fetching.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, options: &QueryOptions, fetcher: F) -> ClientResult<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        if !options.enabled || !key.is_enabled() {
            return Ok(None);
        }

        let cached = self.read(|entries| {
            entries
                .get(&key)
                .filter(|entry| entry.is_fresh(options.stale_time))
                .map(|entry| entry.data.clone())
        });
        if let Some(data) = cached {
            if let Ok(value) = serde_json::from_value(data) {
                tracing::debug!(%key, "Query served from cache");
                return Ok(Some(value));
            }
        }

        let value = options.retry.run(fetcher).await?;
        self.set(key, serde_json::to_value(&value)?);
        Ok(Some(value))
    }

    fn read<R>(&self, f: impl FnOnce(&HashMap<QueryKey, CacheEntry>) -> R) -> R {
        f(&self.entries.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write<R>(&self, f: impl FnOnce(&mut HashMap<QueryKey, CacheEntry>) -> R) -> R {
        f(&mut self.entries.write().unwrap_or_else(PoisonError::into_inner))
    }
}
