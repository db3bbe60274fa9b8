//! Scan Result Cache Module
//!
//! TTL-bounded key-value store for serialized scan results. Two backends
//! implement the same non-throwing contract:
//! - `MemoryScanCache`: DashMap, no lock contention across scans
//! - `RedisScanCache`: shared cache across API instances (utils/redis_cache.rs)
//!
//! Values are stored as the JSON string of the result so a read returns
//! exactly the bytes that were written.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::utils::constants::CACHE_KEY_PREFIX;

/// Cache key for a token address (`scan:{address}`)
#[inline]
pub fn scan_cache_key(address: &str) -> String {
    format!("{}{}", CACHE_KEY_PREFIX, address)
}

/// Non-throwing cache contract. Backend failures read as a miss / `false`.
#[async_trait]
pub trait ScanCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    /// Store `value` with a TTL, returns false when the backend rejected it
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> bool;

    /// Remove `key`, returns true when an entry was deleted
    async fn del(&self, key: &str) -> bool;

    /// Backend name for logs and stats
    fn backend(&self) -> &'static str;

    /// Hit/miss counters, when the backend keeps them
    fn stats(&self) -> Option<CacheStats> {
        None
    }

    /// Drop expired entries, returns how many were removed
    fn cleanup_expired(&self) -> usize {
        0
    }
}

/// Cache entry with creation time for TTL validation
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub value: String,
    pub created_at: Instant,
    pub ttl_secs: u64,
}

impl CacheEntry {
    pub fn new(value: String, ttl_secs: u64) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            ttl_secs,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= Duration::from_secs(self.ttl_secs)
    }

    /// Seconds left before expiry
    pub fn remaining_ttl(&self) -> u64 {
        let elapsed = self.created_at.elapsed().as_secs();
        self.ttl_secs.saturating_sub(elapsed)
    }
}

/// In-process cache backed by DashMap
#[derive(Clone, Default)]
pub struct MemoryScanCache {
    store: Arc<DashMap<String, CacheEntry>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl MemoryScanCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn clear(&self) {
        self.store.clear();
        info!("🗑️ CACHE CLEARED");
    }
}

#[async_trait]
impl ScanCache for MemoryScanCache {
    async fn get(&self, key: &str) -> Option<String> {
        if let Some(entry) = self.store.get(key) {
            if entry.is_expired() {
                drop(entry); // release read guard before remove
                self.store.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("📭 CACHE MISS (expired): {}", key);
                None
            } else {
                self.hits.fetch_add(1, Ordering::Relaxed);
                info!("✅ CACHE HIT: {} (TTL: {}s remaining)", key, entry.remaining_ttl());
                Some(entry.value.clone())
            }
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("📭 CACHE MISS: {}", key);
            None
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> bool {
        self.store
            .insert(key.to_string(), CacheEntry::new(value.to_string(), ttl_secs));
        info!("💾 CACHE SET: {} (TTL: {}s)", key, ttl_secs);
        true
    }

    async fn del(&self, key: &str) -> bool {
        let removed = self.store.remove(key).is_some();
        debug!("🗑️ CACHE INVALIDATE: {} (removed: {})", key, removed);
        removed
    }

    fn backend(&self) -> &'static str {
        "memory"
    }

    fn stats(&self) -> Option<CacheStats> {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        Some(CacheStats {
            entries: self.store.len(),
            hits,
            misses,
            hit_rate,
        })
    }

    fn cleanup_expired(&self) -> usize {
        let before = self.store.len();
        self.store.retain(|_, entry| !entry.is_expired());
        let removed = before.saturating_sub(self.store.len());
        if removed > 0 {
            info!("🧹 CACHE CLEANUP: {} expired entries removed", removed);
        }
        removed
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{"contractAddress":"So11111111111111111111111111111111111111112","coalScore":42}"#;

    #[tokio::test]
    async fn test_cache_round_trip_is_byte_identical() {
        let cache = MemoryScanCache::new();
        let key = scan_cache_key("So11111111111111111111111111111111111111112");
        assert_eq!(key, "scan:So11111111111111111111111111111111111111112");

        assert!(cache.set(&key, PAYLOAD, 120).await);
        assert_eq!(cache.get(&key).await.as_deref(), Some(PAYLOAD));
    }

    #[tokio::test]
    async fn test_cache_miss_and_del() {
        let cache = MemoryScanCache::new();
        assert!(cache.get("scan:missing").await.is_none());
        assert!(!cache.del("scan:missing").await);

        cache.set("scan:a", PAYLOAD, 120).await;
        assert!(cache.del("scan:a").await);
        assert!(cache.get("scan:a").await.is_none());
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let cache = MemoryScanCache::new();
        cache.set("scan:a", PAYLOAD, 0).await;
        assert!(cache.get("scan:a").await.is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_and_stats() {
        let cache = MemoryScanCache::new();
        cache.set("scan:live", PAYLOAD, 120).await;
        cache.set("scan:dead", PAYLOAD, 0).await;

        assert_eq!(cache.cleanup_expired(), 1);
        cache.get("scan:live").await; // HIT
        cache.get("scan:nope").await; // MISS

        let stats = cache.stats().unwrap();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, 50.0);
    }
}
