//! Scan Telemetry
//!
//! Anonymous counters about scan traffic, exposed through `GET /api/stats`
//! and printed by the CLI. No token addresses are stored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::models::types::RiskLevel;

/// Aggregated statistics for reporting
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryStats {
    /// Scan requests received
    pub scans_requested: u64,
    /// Served from cache
    pub cache_hits: u64,
    /// Freshly computed
    pub scans_computed: u64,
    /// Scan-fatal failures
    pub scans_failed: u64,
    /// Holders whose history could not be fetched
    pub degraded_holders: u64,
    /// Average latency of computed scans (ms)
    pub avg_latency_ms: f64,
    /// Computed scans by risk level
    pub by_risk_level: HashMap<String, u64>,
    /// Session start (unix seconds)
    pub period_start: i64,
}

impl TelemetryStats {
    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "📊 scans={} cache_hits={} computed={} failed={} degraded_holders={} avg_latency={:.1}ms",
            self.scans_requested,
            self.cache_hits,
            self.scans_computed,
            self.scans_failed,
            self.degraded_holders,
            self.avg_latency_ms,
        )
    }
}

/// Lock-free scan counters
pub struct ScanTelemetry {
    scans_requested: AtomicU64,
    cache_hits: AtomicU64,
    scans_computed: AtomicU64,
    scans_failed: AtomicU64,
    degraded_holders: AtomicU64,
    total_latency_ms: AtomicU64,
    risk_counts: RwLock<HashMap<RiskLevel, u64>>,
    session_start: i64,
}

impl Default for ScanTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanTelemetry {
    pub fn new() -> Self {
        Self {
            scans_requested: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            scans_computed: AtomicU64::new(0),
            scans_failed: AtomicU64::new(0),
            degraded_holders: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            risk_counts: RwLock::new(HashMap::new()),
            session_start: chrono::Utc::now().timestamp(),
        }
    }

    pub fn record_request(&self) {
        self.scans_requested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_computed(&self, risk_level: RiskLevel, latency_ms: u64) {
        self.scans_computed.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        if let Ok(mut counts) = self.risk_counts.write() {
            *counts.entry(risk_level).or_insert(0) += 1;
        }
    }

    pub fn record_failure(&self) {
        self.scans_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_degraded_holders(&self, count: u64) {
        if count > 0 {
            self.degraded_holders.fetch_add(count, Ordering::Relaxed);
        }
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        let computed = self.scans_computed.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);
        let avg_latency_ms = if computed > 0 {
            total_latency as f64 / computed as f64
        } else {
            0.0
        };

        let by_risk_level = self
            .risk_counts
            .read()
            .map(|counts| {
                counts
                    .iter()
                    .map(|(level, count)| (level.as_str().to_string(), *count))
                    .collect()
            })
            .unwrap_or_default();

        TelemetryStats {
            scans_requested: self.scans_requested.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            scans_computed: computed,
            scans_failed: self.scans_failed.load(Ordering::Relaxed),
            degraded_holders: self.degraded_holders.load(Ordering::Relaxed),
            avg_latency_ms,
            by_risk_level,
            period_start: self.session_start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let telemetry = ScanTelemetry::new();
        telemetry.record_request();
        telemetry.record_request();
        telemetry.record_cache_hit();
        telemetry.record_computed(RiskLevel::High, 100);
        telemetry.record_computed(RiskLevel::High, 300);
        telemetry.record_failure();
        telemetry.record_degraded_holders(3);

        let stats = telemetry.get_stats();
        assert_eq!(stats.scans_requested, 2);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.scans_computed, 2);
        assert_eq!(stats.scans_failed, 1);
        assert_eq!(stats.degraded_holders, 3);
        assert_eq!(stats.avg_latency_ms, 200.0);
        assert_eq!(stats.by_risk_level.get("HIGH"), Some(&2));
        assert!(stats.summary().contains("scans=2"));
    }

    #[test]
    fn test_counts_per_risk_level() {
        let telemetry = ScanTelemetry::new();
        for level in [RiskLevel::Low, RiskLevel::Extreme, RiskLevel::Low, RiskLevel::Medium] {
            telemetry.record_computed(level, 10);
        }

        let by_level = telemetry.get_stats().by_risk_level;
        assert_eq!(by_level.get("LOW"), Some(&2));
        assert_eq!(by_level.get("MEDIUM"), Some(&1));
        assert_eq!(by_level.get("EXTREME"), Some(&1));
        assert_eq!(by_level.get("HIGH"), None);
    }
}
