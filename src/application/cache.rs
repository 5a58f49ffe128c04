use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::ports::CacheStore;

/// Typed, failure-swallowing wrapper over a `CacheStore`.
///
/// Every error is logged and treated as a miss so callers fall back to the
/// database.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("cache get {key} failed: {e}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("cache entry {key} is not decodable, dropping it: {e}");
                self.invalidate(key);
                None
            }
        }
    }

    pub fn put_json<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("cache value for {key} is not encodable: {e}");
                return;
            }
        };
        if let Err(e) = self.store.set(key, &raw, ttl) {
            log::warn!("cache set {key} failed: {e}");
        }
    }

    pub fn invalidate(&self, key: &str) {
        if let Err(e) = self.store.del(key) {
            log::warn!("cache del {key} failed: {e}");
        }
    }

    /// Current generation of a key namespace. Listing keys embed it so a
    /// single bump orphans every cached page at once.
    pub fn generation(&self, namespace: &str) -> u64 {
        self.get_json::<u64>(&format!("{namespace}:generation"))
            .unwrap_or(0)
    }

    pub fn bump_generation(&self, namespace: &str) {
        let next = self.generation(namespace).wrapping_add(1);
        self.put_json(&format!("{namespace}:generation"), &next, None);
    }
}
