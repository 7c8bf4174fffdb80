//! Optimistic cache edits with a compensating rollback.

use serde_json::Value;

use super::cache::{QueryCache, QueryKey};

/// Records what each touched entry held before the edit so the edit can be
/// undone if the server rejects the mutation.
#[derive(Debug)]
pub struct OptimisticUpdate {
    cache: QueryCache,
    snapshots: Vec<(QueryKey, Option<Value>)>,
}

impl OptimisticUpdate {
    pub fn new(cache: &QueryCache) -> Self {
        Self {
            cache: cache.clone(),
            snapshots: Vec::new(),
        }
    }

    /// Snapshot `key` (first touch only) and apply `f` to it.
    pub fn apply<F>(&mut self, key: &QueryKey, f: F) -> &mut Self
    where
        F: FnOnce(Option<Value>) -> Option<Value>,
    {
        if !self.snapshots.iter().any(|(seen, _)| seen == key) {
            self.snapshots.push((key.clone(), self.cache.get(key)));
        }
        self.cache.update(key, f);
        self
    }

    /// Restore every touched entry to its snapshot.
    pub fn rollback(self) {
        for (key, previous) in self.snapshots.into_iter().rev() {
            tracing::debug!(%key, "Rolling back optimistic update");
            match previous {
                Some(data) => self.cache.set(key, data),
                None => {
                    self.cache.remove(&key);
                }
            }
        }
    }

    /// Keep the edit; the snapshots are dropped.
    pub fn commit(self) {}
}

/// Append `item` to a cached JSON list, starting a new list when there is none.
pub fn append_item(list: Option<Value>, item: Value) -> Option<Value> {
    match list {
        Some(Value::Array(mut items)) => {
            items.push(item);
            Some(Value::Array(items))
        }
        _ => Some(Value::Array(vec![item])),
    }
}

/// Placeholder id for an optimistic entry.
pub fn temp_id() -> String {
    format!("temp-{}", chrono::Utc::now().timestamp_millis())
}
