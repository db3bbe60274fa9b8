//! Scan Orchestrator
//!
//! Sequences one scan: validate → cache → metadata → safety + reputation →
//! holders → enrichment → bundles → score → cache write.
//!
//! Metadata and holder-list failures are fatal (no synthetic fallback).
//! Safety and reputation failures fall back to documented defaults. Cache
//! failures never fail a scan.

use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::core::bundle_detector::{apply_connections, BundleDetector};
use crate::core::enrichment::{apply_market_data, HolderEnricher};
use crate::core::score::{CoalScoreCalculator, ScoreInput};
use crate::models::config::ScanConfig;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{DevReputation, LpSafety, ScanStatus, TokenScanResult};
use crate::providers::gateway::TokenGateway;
use crate::providers::solana::SolanaGateway;
use crate::utils::cache::{scan_cache_key, CacheStats, MemoryScanCache, ScanCache};
use crate::utils::jitter::{JitterSource, ThreadRngJitter};
use crate::utils::redis_cache::RedisScanCache;
use crate::utils::retry::with_retry;
use crate::utils::telemetry::{ScanTelemetry, TelemetryStats};
use crate::utils::validation::validate_address;

pub struct ScanService {
    gateway: Arc<dyn TokenGateway>,
    cache: Arc<dyn ScanCache>,
    calculator: CoalScoreCalculator,
    detector: BundleDetector,
    enricher: HolderEnricher,
    jitter: Arc<dyn JitterSource>,
    telemetry: ScanTelemetry,
    config: ScanConfig,
}

impl ScanService {
    pub fn new(config: ScanConfig, gateway: Arc<dyn TokenGateway>, cache: Arc<dyn ScanCache>) -> Self {
        Self::with_jitter(config, gateway, cache, Arc::new(ThreadRngJitter))
    }

    /// Production wiring: Solana gateway plus Redis when `REDIS_URL` is set,
    /// memory cache otherwise (or when Redis is unreachable)
    pub async fn from_config(config: ScanConfig) -> AppResult<Self> {
        let gateway = Arc::new(SolanaGateway::new(
            &config.rpc_url,
            &config.price_api_url,
            config.rpc_timeout,
        )?);

        let cache: Arc<dyn ScanCache> = match config.redis_url.as_deref() {
            Some(url) => match RedisScanCache::connect(url).await {
                Ok(redis) => Arc::new(redis),
                Err(e) => {
                    warn!("⚠️ Redis unavailable, falling back to memory cache: {}", e);
                    Arc::new(MemoryScanCache::new())
                }
            },
            None => Arc::new(MemoryScanCache::new()),
        };

        Ok(Self::new(config, gateway, cache))
    }

    /// Same as `new` with an explicit randomness source (bundle scores, retry backoff)
    pub fn with_jitter(
        config: ScanConfig,
        gateway: Arc<dyn TokenGateway>,
        cache: Arc<dyn ScanCache>,
        jitter: Arc<dyn JitterSource>,
    ) -> Self {
        let enricher = HolderEnricher::new(
            gateway.clone(),
            config.retry,
            jitter.clone(),
            config.tx_history_limit,
            config.enrich_concurrency,
        );

        info!(
            "🔥 ScanService ready (gateway: {}, cache: {}, ttl: {}s, holders: {})",
            gateway.name(),
            cache.backend(),
            config.cache_ttl_secs,
            config.holder_limit
        );

        Self {
            gateway,
            cache,
            calculator: CoalScoreCalculator::new(),
            detector: BundleDetector::new(jitter.clone()),
            enricher,
            jitter,
            telemetry: ScanTelemetry::new(),
            config,
        }
    }

    /// Scan a token, serving from cache unless `force_refresh`
    pub async fn scan(&self, address: &str, force_refresh: bool) -> AppResult<TokenScanResult> {
        let address = validate_address(address)?;
        self.telemetry.record_request();
        let key = scan_cache_key(&address);

        if !force_refresh {
            if let Some(cached) = self.cached_result(&key).await {
                self.telemetry.record_cache_hit();
                return Ok(cached);
            }
        }

        let start = Instant::now();
        info!("🔍 Scanning {} (force_refresh: {})", address, force_refresh);

        match self.compute(&address).await {
            Ok(result) => {
                let latency_ms = start.elapsed().as_millis() as u64;
                self.telemetry.record_computed(result.risk_level, latency_ms);
                self.store(&key, &result).await;

                info!(
                    "{} {} scored {} ({}) in {}ms",
                    result.risk_level.emoji(),
                    address,
                    result.coal_score,
                    result.risk_level.as_str(),
                    latency_ms
                );
                Ok(result)
            }
            Err(e) => {
                self.telemetry.record_failure();
                error!("❌ Scan failed for {}: {}", address, e);
                Err(e)
            }
        }
    }

    async fn compute(&self, address: &str) -> AppResult<TokenScanResult> {
        let retry = &self.config.retry;
        let jitter = self.jitter.as_ref();

        let metadata = with_retry("token_metadata", retry, jitter, || {
            self.gateway.token_metadata(address)
        })
        .await
        .map_err(|e| upstream("token metadata", e))?
        .ok_or_else(|| AppError::token_not_found(format!("Token {} not found", address)))?;

        let (lp_safety, dev_reputation) = tokio::join!(
            with_retry("lp_safety", retry, jitter, || self.gateway.lp_safety(address)),
            with_retry("dev_reputation", retry, jitter, || {
                self.gateway.dev_reputation(address)
            }),
        );
        let lp_safety = lp_safety.unwrap_or_else(|e| {
            warn!("⚠️ LP safety unavailable for {}, assuming no risk evidence: {}", address, e);
            LpSafety::default()
        });
        let dev_reputation = dev_reputation.unwrap_or_else(|e| {
            warn!("⚠️ Dev reputation unavailable for {}, using neutral score: {}", address, e);
            DevReputation::unknown()
        });

        let deployer = Some(dev_reputation.deployer_address.as_str()).filter(|d| *d != "Unknown");
        let outcome = self
            .enricher
            .fetch_holders(address, self.config.holder_limit, deployer)
            .await
            .map_err(|e| upstream("holder list", e))?;

        if outcome.holders.is_empty() {
            return Err(AppError::no_holders(format!("No holders found for {}", address)));
        }
        if outcome.degraded > 0 {
            warn!(
                "⚠️ {}/{} holders degraded for {}",
                outcome.degraded,
                outcome.holders.len(),
                address
            );
            self.telemetry.record_degraded_holders(outcome.degraded as u64);
        }

        let mut holders = outcome.holders;
        apply_market_data(&mut holders, metadata.supply, metadata.price);

        let now_ms = chrono::Utc::now().timestamp_millis();
        let bundles = self.detector.detect(&holders, now_ms);
        apply_connections(&mut holders, &bundles);

        Ok(self.calculator.calculate(ScoreInput {
            contract_address: address.to_string(),
            scan_timestamp: now_ms,
            holders,
            bundles,
            market_cap: metadata.market_cap,
            token_age: metadata.age,
            lp_safety: Some(lp_safety),
            dev_reputation: Some(dev_reputation),
            metadata: Some(metadata),
        }))
    }

    async fn cached_result(&self, key: &str) -> Option<TokenScanResult> {
        let raw = self.cache.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("⚠️ Discarding unreadable cache entry {}: {}", key, e);
                None
            }
        }
    }

    async fn store(&self, key: &str, result: &TokenScanResult) {
        match serde_json::to_string(result) {
            Ok(json) => {
                if !self.cache.set(key, &json, self.config.cache_ttl_secs).await {
                    warn!("⚠️ Cache write failed for {}, result not cached", key);
                }
            }
            Err(e) => warn!("⚠️ Failed to serialize scan result for {}: {}", key, e),
        }
    }

    /// Whether a fresh result is cached, and when it was computed
    pub async fn scan_status(&self, address: &str) -> AppResult<ScanStatus> {
        let address = validate_address(address)?;
        let status = match self.cache.get(&scan_cache_key(&address)).await {
            Some(raw) => ScanStatus {
                cached: true,
                timestamp: serde_json::from_str::<serde_json::Value>(&raw)
                    .ok()
                    .and_then(|v| v.get("scanTimestamp").and_then(|t| t.as_i64())),
            },
            None => ScanStatus {
                cached: false,
                timestamp: None,
            },
        };
        Ok(status)
    }

    /// Drop the cached result. Returns whether an entry was removed.
    pub async fn invalidate(&self, address: &str) -> AppResult<bool> {
        let address = validate_address(address)?;
        let removed = self.cache.del(&scan_cache_key(&address)).await;
        if removed {
            info!("🗑️ Invalidated cached scan for {}", address);
        }
        Ok(removed)
    }

    /// Drop expired entries from caches that need manual sweeping
    pub fn cleanup_cache(&self) -> usize {
        self.cache.cleanup_expired()
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.stats()
    }

    pub fn cache_backend(&self) -> &'static str {
        self.cache.backend()
    }

    pub fn gateway_name(&self) -> &'static str {
        self.gateway.name()
    }

    pub fn stats(&self) -> TelemetryStats {
        self.telemetry.get_stats()
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }
}

/// Fatal upstream failure, keeping not-found classification
fn upstream(what: &str, e: AppError) -> AppError {
    match e.code {
        ErrorCode::TokenNotFound | ErrorCode::NoHolders | ErrorCode::ValidationError => e,
        _ => AppError::with_source(
            ErrorCode::UpstreamUnavailable,
            format!("Failed to fetch {}: {}", what, e.message),
            e,
        ),
    }
}
