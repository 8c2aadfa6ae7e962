//! TTL cache for account listings
//!
//! Uses the `cached` crate's `TimedCache` for expiration. Entries are JSON
//! strings keyed by `accounts:{user_id}`; the account service owns both the
//! encoding and the invalidation.

use async_trait::async_trait;
use cached::{Cached, TimedCache};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::account::models::UserId;

/// Default entry lifetime in seconds
pub const DEFAULT_TTL_SECONDS: u64 = 600;

/// Key of a user's cached account listing
pub fn accounts_cache_key(user_id: UserId) -> String {
    format!("accounts:{}", user_id)
}

/// Key-value cache consulted by the account service.
///
/// Implementations swallow their own failures; a cache problem must never
/// fail the request that touched it.
#[async_trait]
pub trait CacheClient: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    async fn set(&self, key: &str, value: String);

    async fn delete(&self, keys: &[String]);
}

/// In-process cache with a fixed entry lifetime
pub struct TimedCacheClient {
    entries: Mutex<TimedCache<String, String>>,
}

impl TimedCacheClient {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: Mutex::new(TimedCache::with_lifespan(ttl_secs)),
        }
    }

    fn entries(&self) -> MutexGuard<'_, TimedCache<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored entries, expired ones included until next touched
    pub fn len(&self) -> usize {
        self.entries().cache_size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TimedCacheClient {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_SECONDS)
    }
}

#[async_trait]
impl CacheClient for TimedCacheClient {
    async fn get(&self, key: &str) -> Option<String> {
        let hit = self.entries().cache_get(key).cloned();
        tracing::trace!(key, hit = hit.is_some(), "[cache] get");
        hit
    }

    async fn set(&self, key: &str, value: String) {
        self.entries().cache_set(key.to_string(), value);
    }

    async fn delete(&self, keys: &[String]) {
        let mut entries = self.entries();
        for key in keys {
            entries.cache_remove(key);
        }
        tracing::debug!(?keys, "[cache] invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        assert_eq!(accounts_cache_key(42), "accounts:42");
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = TimedCacheClient::default();
        assert!(cache.get("accounts:1").await.is_none());

        cache.set("accounts:1", "[]".to_string()).await;
        cache.set("accounts:2", "[{}]".to_string()).await;
        assert_eq!(cache.get("accounts:1").await.as_deref(), Some("[]"));
        assert_eq!(cache.len(), 2);

        cache
            .delete(&["accounts:1".to_string(), "accounts:3".to_string()])
            .await;
        assert!(cache.get("accounts:1").await.is_none());
        assert!(cache.get("accounts:2").await.is_some());
    }
}
