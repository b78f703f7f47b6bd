// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Result Caching Module
 * Keyed response cache with moka, per-entry TTL, and hit/miss metrics
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use moka::future::Cache;
use moka::Expiry;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// Cached response envelope with its own lifetime. Single-check and batch
/// entries share one store but carry different TTLs.
#[derive(Debug, Clone)]
pub struct CachedEntry {
    pub body: serde_json::Value,
    pub ttl_secs: u64,
}

struct PerEntryTtl;

impl Expiry<String, CachedEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(Duration::from_secs(value.ttl_secs))
    }
}

/// Response cache keyed by a content hash of the raw input URL
pub struct ResultCache {
    cache: Cache<String, CachedEntry>,
    enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    pub fn new(enabled: bool, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        info!(
            enabled = enabled,
            max_capacity = max_capacity,
            "Result cache initialized"
        );

        Self {
            cache,
            enabled,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Stable cache key for a raw input URL
    pub fn key_for(url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        format!("site_check:{}", hex::encode(hasher.finalize()))
    }

    /// Fetch a cached response body, if present and unexpired
    pub async fn get(&self, url: &str) -> Option<serde_json::Value> {
        if !self.enabled {
            return None;
        }

        let key = Self::key_for(url);
        match self.cache.get(&key).await {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(url = url, "Cache hit");
                Some(entry.body)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(url = url, "Cache miss");
                None
            }
        }
    }

    /// Store a response body. Last writer wins; concurrent duplicate checks
    /// racing to write equivalent results is harmless.
    pub async fn set(&self, url: &str, body: serde_json::Value, ttl_secs: u64) {
        if !self.enabled {
            return;
        }

        let key = Self::key_for(url);
        self.cache.insert(key, CachedEntry { body, ttl_secs }).await;
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        debug!("Result cache cleared");
    }

    /// Get entry count
    pub async fn size(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            hits,
            misses,
            hit_rate,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_is_stable_and_distinct() {
        let a = ResultCache::key_for("https://example.com");
        let b = ResultCache::key_for("https://example.com");
        let c = ResultCache::key_for("https://example.org");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("site_check:"));
    }

    #[tokio::test]
    async fn test_cache_roundtrip() {
        let cache = ResultCache::new(true, 100);
        let body = json!({"url": "https://example.com", "score": 85.0});

        cache.set("https://example.com", body.clone(), 60).await;
        let fetched = cache.get("https://example.com").await;
        assert_eq!(fetched, Some(body));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test]
    async fn test_cache_miss_counts() {
        let cache = ResultCache::new(true, 100);
        assert!(cache.get("https://never-stored.example").await.is_none());

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_disabled_cache_stores_nothing() {
        let cache = ResultCache::new(false, 100);
        cache.set("https://example.com", json!({}), 60).await;
        assert!(cache.get("https://example.com").await.is_none());
        assert_eq!(cache.size().await, 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = ResultCache::new(true, 100);
        cache.set("https://example.com", json!({}), 60).await;
        cache.clear().await;
        assert_eq!(cache.size().await, 0);
    }
}
