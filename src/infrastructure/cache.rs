//! `CacheStore` backends: Redis when configured, otherwise process memory.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use redis::Commands;

use crate::domain::errors::DomainError;
use crate::domain::ports::CacheStore;

struct CacheEntry {
    data: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(data: String, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.map(|d| Instant::now() + d);
        CacheEntry { data, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() > exp)
    }
}

/// Writes between sweeps of expired entries.
const SWEEP_EVERY: usize = 256;

/// Per-process cache on a sharded map. Expired entries are dropped when read
/// and swept out periodically on write, so keys that are never read again
/// do not pile up.
#[derive(Clone, Default)]
pub struct InMemoryCache {
    store: Arc<DashMap<String, CacheEntry>>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Drops every expired entry and returns how many went.
    pub fn purge_expired(&self) -> usize {
        let before = self.store.len();
        self.store.retain(|_, entry| !entry.is_expired());
        let purged = before.saturating_sub(self.store.len());
        if purged > 0 {
            log::debug!("purged {purged} expired cache entries");
        }
        purged
    }
}

impl CacheStore for InMemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        if let Some(entry) = self.store.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.data.clone()));
            }
        }
        // Guard on expiry again so a concurrent fresh write is not removed.
        self.store.remove_if(key, |_, entry| entry.is_expired());
        Ok(None)
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), DomainError> {
        self.store
            .insert(key.to_string(), CacheEntry::new(value.to_string(), ttl));
        if self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.purge_expired();
        }
        Ok(())
    }

    fn del(&self, key: &str) -> Result<(), DomainError> {
        self.store.remove(key);
        Ok(())
    }
}

pub type RedisPool = r2d2::Pool<redis::Client>;

fn redis_error(e: redis::RedisError) -> DomainError {
    DomainError::Internal(format!("redis: {e}"))
}

/// Shared cache on Redis through a blocking connection pool.
pub struct RedisCache {
    pool: RedisPool,
}

impl RedisCache {
    pub fn connect(url: &str) -> Result<Self, DomainError> {
        let client = redis::Client::open(url).map_err(redis_error)?;
        let pool = r2d2::Pool::builder()
            .max_size(16)
            .connection_timeout(Duration::from_secs(2))
            .build(client)?;
        Ok(Self { pool })
    }
}

impl CacheStore for RedisCache {
    fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.pool.get()?;
        conn.get(key).map_err(redis_error)
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        match ttl {
            Some(ttl) => conn
                .set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
                .map_err(redis_error),
            None => conn.set::<_, _, ()>(key, value).map_err(redis_error),
        }
    }

    fn del(&self, key: &str) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        conn.del::<_, ()>(key).map_err(redis_error)
    }

    fn exists(&self, key: &str) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        conn.exists(key).map_err(redis_error)
    }
}
