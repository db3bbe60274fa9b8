//! Redis-backed scan cache
//!
//! Shares results across API instances. Connection or command failures are
//! logged and read as a cache miss so a scan always falls through to compute.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{debug, info, warn};

use crate::models::errors::AppResult;
use crate::utils::cache::ScanCache;

#[derive(Clone)]
pub struct RedisScanCache {
    conn: MultiplexedConnection,
}

impl RedisScanCache {
    /// Open a multiplexed connection to `redis_url`
    pub async fn connect(redis_url: &str) -> AppResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!("✅ Redis cache connected");
        Ok(Self { conn })
    }
}

#[async_trait]
impl ScanCache for RedisScanCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(value)) => {
                info!("✅ CACHE HIT: {}", key);
                Some(value)
            }
            Ok(None) => {
                debug!("📭 CACHE MISS: {}", key);
                None
            }
            Err(e) => {
                warn!("⚠️ Redis GET failed for {}: {}", key, e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> bool {
        let mut conn = self.conn.clone();
        let result: redis::RedisResult<()> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_secs.max(1))
            .query_async(&mut conn)
            .await;

        match result {
            Ok(()) => {
                info!("💾 CACHE SET: {} (TTL: {}s)", key, ttl_secs);
                true
            }
            Err(e) => {
                warn!("⚠️ Redis SET failed for {}: {}", key, e);
                false
            }
        }
    }

    async fn del(&self, key: &str) -> bool {
        let mut conn = self.conn.clone();
        match conn.del::<_, i64>(key).await {
            Ok(removed) => removed > 0,
            Err(e) => {
                warn!("⚠️ Redis DEL failed for {}: {}", key, e);
                false
            }
        }
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
