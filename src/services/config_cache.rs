// src/services/config_cache.rs
// DOCUMENTATION: In-memory cache for system configuration values
// PURPOSE: Avoid a database round-trip on every pricing/cancellation
// decision

use crate::db::ConfigRepository;
use crate::errors::FindamError;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Cache entry with expiration
#[derive(Clone, Debug)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Thread-safe TTL cache over findam_system_configs
pub struct ConfigCache {
    store: Arc<RwLock<HashMap<String, CacheEntry>>>,
    default_ttl: Duration,
}

impl ConfigCache {
    /// Create new cache with default TTL
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            default_ttl: Duration::from_secs(ttl_seconds),
        }
    }

    /// Get cached value
    pub async fn get(&self, key: &str) -> Option<String> {
        let store = self.store.read().await;

        if let Some(entry) = store.get(key) {
            if !entry.is_expired() {
                log::debug!("Config cache HIT for key: {}", key);
                return Some(entry.value.clone());
            }
            log::debug!("Config cache EXPIRED for key: {}", key);
        } else {
            log::debug!("Config cache MISS for key: {}", key);
        }

        None
    }

    /// Set cached value with default TTL
    pub async fn set(&self, key: String, value: String) {
        let mut store = self.store.write().await;
        store.insert(key.clone(), CacheEntry::new(value, self.default_ttl));
        log::debug!(
            "Config cache SET for key: {} (TTL: {}s)",
            key,
            self.default_ttl.as_secs()
        );
    }

    /// Drop a key (called after an admin updates the value)
    pub async fn invalidate(&self, key: &str) {
        let mut store = self.store.write().await;
        store.remove(key);
    }

    /// Resolve a configuration value, loading it from the database on a
    /// miss and falling back to the provided default
    pub async fn get_or_load(
        &self,
        pool: &PgPool,
        key: &str,
        default: &str,
    ) -> Result<String, FindamError> {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = ConfigRepository::get(pool, key)
            .await?
            .unwrap_or_else(|| default.to_string());

        self.set(key.to_string(), value.clone()).await;
        Ok(value)
    }

    /// Typed helper for integer configuration values
    pub async fn get_i64(
        &self,
        pool: &PgPool,
        key: &str,
        default: i64,
    ) -> Result<i64, FindamError> {
        let raw = self.get_or_load(pool, key, &default.to_string()).await?;
        Ok(raw.parse().unwrap_or(default))
    }

    /// Typed helper for percentage configuration values
    pub async fn get_f64(
        &self,
        pool: &PgPool,
        key: &str,
        default: f64,
    ) -> Result<f64, FindamError> {
        let raw = self.get_or_load(pool, key, &default.to_string()).await?;
        Ok(raw.parse().unwrap_or(default))
    }

    /// Clear expired entries
    pub async fn cleanup(&self) {
        let mut store = self.store.write().await;
        let before_count = store.len();
        store.retain(|_, entry| !entry.is_expired());
        let after_count = store.len();

        if before_count > after_count {
            log::info!(
                "Config cache cleanup: removed {} expired entries ({} remaining)",
                before_count - after_count,
                after_count
            );
        }
    }

    /// Get cache statistics
    pub async fn stats(&self) -> ConfigCacheStats {
        let store = self.store.read().await;
        let total = store.len();
        let expired = store.values().filter(|e| e.is_expired()).count();

        ConfigCacheStats {
            total_entries: total,
            expired_entries: expired,
            active_entries: total - expired,
        }
    }
}

/// Cache statistics
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigCacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

/// Start background cleanup task
/// DOCUMENTATION: Periodically removes expired entries
pub fn start_cleanup_task(cache: Arc<ConfigCache>, interval_seconds: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));

        loop {
            interval.tick().await;
            cache.cleanup().await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_set_get() {
        let cache = ConfigCache::new(60);

        cache
            .set("TENANT_SERVICE_FEE_PERCENTAGE".to_string(), "7.0".to_string())
            .await;
        let result = cache.get("TENANT_SERVICE_FEE_PERCENTAGE").await;

        assert_eq!(result, Some("7.0".to_string()));
    }

    #[tokio::test]
    async fn test_cache_expiration() {
        let cache = ConfigCache::new(1); // 1 second TTL

        cache.set("KEY".to_string(), "value".to_string()).await;

        // Should exist immediately
        assert!(cache.get("KEY").await.is_some());

        // Wait for expiration
        tokio::time::sleep(Duration::from_secs(2)).await;

        // Should be expired
        assert!(cache.get("KEY").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_invalidation() {
        let cache = ConfigCache::new(60);

        cache.set("KEY".to_string(), "old".to_string()).await;
        cache.invalidate("KEY").await;

        assert!(cache.get("KEY").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_cleanup() {
        let cache = ConfigCache::new(1);

        cache.set("key1".to_string(), "value1".to_string()).await;
        cache.set("key2".to_string(), "value2".to_string()).await;

        tokio::time::sleep(Duration::from_secs(2)).await;

        cache.cleanup().await;

        let stats = cache.stats().await;
        assert_eq!(stats.active_entries, 0);
    }
}
