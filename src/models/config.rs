//! Configuration module for Coal Scan
//!
//! All values come from the environment with defaults from
//! utils/constants.rs. Invalid numbers fall back to the default with a warning.

use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::utils::constants::{
    DEFAULT_API_HOST, DEFAULT_API_PORT, DEFAULT_API_RATE_LIMIT,
    DEFAULT_API_RATE_LIMIT_WINDOW_SECS, DEFAULT_CACHE_TTL_SECS, DEFAULT_ENRICH_CONCURRENCY,
    DEFAULT_HOLDER_LIMIT, DEFAULT_PRICE_API_URL, DEFAULT_RETRY_BASE_DELAY_MS,
    DEFAULT_RETRY_MAX_ATTEMPTS, DEFAULT_RPC_TIMEOUT_SECS, DEFAULT_SOLANA_RPC_URL,
    DEFAULT_TX_HISTORY_LIMIT, MAX_HOLDER_LIMIT,
};

/// Retry policy for gateway calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// No retries, no waiting
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }
}

/// Scanner and API configuration
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub host: String,
    pub port: u16,
    pub rpc_url: String,
    pub price_api_url: String,
    /// Memory cache is used when unset
    pub redis_url: Option<String>,
    pub cache_ttl_secs: u64,
    pub holder_limit: usize,
    pub tx_history_limit: usize,
    pub enrich_concurrency: usize,
    pub retry: RetryPolicy,
    pub rpc_timeout: Duration,
    pub rate_limit: u32,
    pub rate_limit_window: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_API_HOST.to_string(),
            port: DEFAULT_API_PORT,
            rpc_url: DEFAULT_SOLANA_RPC_URL.to_string(),
            price_api_url: DEFAULT_PRICE_API_URL.to_string(),
            redis_url: None,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            holder_limit: DEFAULT_HOLDER_LIMIT,
            tx_history_limit: DEFAULT_TX_HISTORY_LIMIT,
            enrich_concurrency: DEFAULT_ENRICH_CONCURRENCY,
            retry: RetryPolicy::default(),
            rpc_timeout: Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS),
            rate_limit: DEFAULT_API_RATE_LIMIT,
            rate_limit_window: Duration::from_secs(DEFAULT_API_RATE_LIMIT_WINDOW_SECS),
        }
    }
}

impl ScanConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = lookup("PORT")
            .or_else(|| lookup("COAL_PORT"))
            .map(|raw| parse_or("PORT", &raw, defaults.port))
            .unwrap_or(defaults.port);

        let redis_url = lookup("REDIS_URL").filter(|url| !url.trim().is_empty());
        if redis_url.is_some() {
            // URL may carry credentials, never log it
            info!("🔑 REDIS_URL configured (value hidden)");
        }

        let holder_limit =
            env_num(&lookup, "HOLDER_LIMIT", defaults.holder_limit).clamp(1, MAX_HOLDER_LIMIT);

        Self {
            host: lookup("COAL_HOST").unwrap_or(defaults.host),
            port,
            rpc_url: lookup("SOLANA_RPC_URL").unwrap_or(defaults.rpc_url),
            price_api_url: lookup("PRICE_API_URL").unwrap_or(defaults.price_api_url),
            redis_url,
            cache_ttl_secs: env_num(&lookup, "CACHE_TTL_SECS", defaults.cache_ttl_secs).max(1),
            holder_limit,
            tx_history_limit: env_num(&lookup, "TX_HISTORY_LIMIT", defaults.tx_history_limit),
            enrich_concurrency: env_num(&lookup, "ENRICH_CONCURRENCY", defaults.enrich_concurrency)
                .max(1),
            retry: RetryPolicy {
                max_attempts: env_num(&lookup, "RETRY_MAX_ATTEMPTS", defaults.retry.max_attempts)
                    .max(1),
                base_delay: Duration::from_millis(env_num(
                    &lookup,
                    "RETRY_BASE_DELAY_MS",
                    DEFAULT_RETRY_BASE_DELAY_MS,
                )),
            },
            rpc_timeout: Duration::from_secs(env_num(
                &lookup,
                "RPC_TIMEOUT_SECS",
                DEFAULT_RPC_TIMEOUT_SECS,
            )),
            rate_limit: env_num(&lookup, "API_RATE_LIMIT", defaults.rate_limit),
            rate_limit_window: Duration::from_secs(env_num(
                &lookup,
                "API_RATE_LIMIT_WINDOW_SECS",
                DEFAULT_API_RATE_LIMIT_WINDOW_SECS,
            )),
        }
    }

    /// Socket address string for the API listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_num<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => parse_or(key, &raw, default),
        None => default,
    }
}

fn parse_or<T>(key: &str, raw: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            warn!(key, value = raw, "Invalid config value, using default {}", default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ScanConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.port, 3001);
        assert_eq!(config.cache_ttl_secs, 120);
        assert_eq!(config.holder_limit, 20);
        assert_eq!(config.tx_history_limit, 10);
        assert_eq!(config.enrich_concurrency, 5);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay, Duration::from_millis(250));
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_overrides_and_clamping() {
        let config = ScanConfig::from_lookup(lookup_from(&[
            ("COAL_PORT", "8080"),
            ("HOLDER_LIMIT", "500"),
            ("CACHE_TTL_SECS", "30"),
            ("REDIS_URL", "redis://localhost:6379"),
        ]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.holder_limit, 50);
        assert_eq!(config.cache_ttl_secs, 30);
        assert_eq!(config.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ScanConfig::from_lookup(lookup_from(&[
            ("PORT", "not-a-port"),
            ("HOLDER_LIMIT", "0"),
            ("ENRICH_CONCURRENCY", "abc"),
        ]));
        assert_eq!(config.port, 3001);
        assert_eq!(config.holder_limit, 1);
        assert_eq!(config.enrich_concurrency, 5);
    }
}
