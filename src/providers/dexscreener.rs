//! DexScreener API Client - market data for scanned tokens
//!
//! ✅ USED FOR:
//! - USD price and market cap (drives the low market cap override)
//! - Pair creation time (token age when the chain history is too deep)
//! - Token name and symbol
//!
//! ❌ NOT USED FOR:
//! - Holder data, LP state or deployer history (on-chain only)
//!
//! API: {PRICE_API_URL}/{tokenAddress}
//! Free, no API key required

use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::models::errors::{AppError, AppResult};
use crate::providers::rpc::build_http_client;

/// DexScreener API response
#[derive(Debug, Deserialize)]
pub struct DexScreenerResponse {
    #[serde(default)]
    pub pairs: Option<Vec<DexPair>>,
}

/// A trading pair from DexScreener
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexPair {
    /// Chain ID (e.g., "solana")
    pub chain_id: String,
    /// DEX identifier (e.g., "raydium", "pumpswap")
    pub dex_id: String,
    pub pair_address: String,
    pub base_token: DexToken,
    pub quote_token: DexToken,
    pub liquidity: Option<DexLiquidity>,
    /// Price in USD
    pub price_usd: Option<String>,
    pub market_cap: Option<f64>,
    pub fdv: Option<f64>,
    /// Unix milliseconds
    pub pair_created_at: Option<i64>,
}

impl DexPair {
    pub fn liquidity_usd(&self) -> f64 {
        self.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0)
    }

    pub fn price(&self) -> f64 {
        self.price_usd
            .as_deref()
            .and_then(|p| p.parse::<f64>().ok())
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DexToken {
    pub address: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DexLiquidity {
    pub usd: Option<f64>,
}

/// Market data reduced from the most liquid pair
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub price_usd: f64,
    /// Market cap, falling back to FDV
    pub market_cap: Option<f64>,
    pub liquidity_usd: f64,
    /// Unix milliseconds
    pub pair_created_at: Option<i64>,
}

impl MarketSnapshot {
    /// Reduce pairs to one snapshot, taking the pair with the deepest liquidity
    /// among those where the token is the base asset
    pub fn from_pairs(token_address: &str, pairs: &[DexPair]) -> Option<Self> {
        let best = pairs
            .iter()
            .filter(|p| p.base_token.address == token_address)
            .max_by(|a, b| {
                a.liquidity_usd()
                    .partial_cmp(&b.liquidity_usd())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })?;

        // Earliest pool is the best proxy for launch time
        let pair_created_at = pairs
            .iter()
            .filter(|p| p.base_token.address == token_address)
            .filter_map(|p| p.pair_created_at)
            .min();

        Some(Self {
            name: best.base_token.name.clone(),
            symbol: best.base_token.symbol.clone(),
            price_usd: best.price(),
            market_cap: best.market_cap.or(best.fdv),
            liquidity_usd: best.liquidity_usd(),
            pair_created_at,
        })
    }
}

/// DexScreener API client
pub struct DexScreenerClient {
    client: reqwest::Client,
    base_url: String,
}

impl DexScreenerClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetch all pairs for a token address
    pub async fn get_token_pairs(&self, token_address: &str) -> AppResult<Vec<DexPair>> {
        let url = format!("{}/{}", self.base_url, token_address);

        debug!("🔍 DexScreener: Fetching pairs for {}", token_address);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AppError::rpc_rate_limited());
        }
        if !status.is_success() {
            return Err(AppError::market_data_error(format!(
                "DexScreener API error: {}",
                status
            )));
        }

        let data: DexScreenerResponse = response.json().await.map_err(|e| {
            AppError::market_data_error(format!("Failed to parse DexScreener response: {}", e))
        })?;

        let pairs = data.pairs.unwrap_or_default();
        info!("📊 DexScreener: Found {} pairs for {}", pairs.len(), token_address);

        Ok(pairs)
    }

    /// Market snapshot for a token, `None` when it is not listed
    pub async fn market_snapshot(&self, token_address: &str) -> AppResult<Option<MarketSnapshot>> {
        let pairs = self.get_token_pairs(token_address).await?;
        Ok(MarketSnapshot::from_pairs(token_address, &pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINT: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

    fn sample_response() -> DexScreenerResponse {
        serde_json::from_value(serde_json::json!({
            "pairs": [
                {
                    "chainId": "solana",
                    "dexId": "orca",
                    "pairAddress": "pairA",
                    "baseToken": {"address": MINT, "name": "Bonk", "symbol": "Bonk"},
                    "quoteToken": {"address": "So11111111111111111111111111111111111111112", "symbol": "SOL"},
                    "liquidity": {"usd": 1000.0},
                    "priceUsd": "0.00002",
                    "fdv": 1500000.0,
                    "pairCreatedAt": 1_672_000_000_000i64
                },
                {
                    "chainId": "solana",
                    "dexId": "raydium",
                    "pairAddress": "pairB",
                    "baseToken": {"address": MINT, "name": "Bonk", "symbol": "Bonk"},
                    "quoteToken": {"address": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", "symbol": "USDC"},
                    "liquidity": {"usd": 250000.0},
                    "priceUsd": "0.000021",
                    "marketCap": 1400000.0,
                    "pairCreatedAt": 1_673_000_000_000i64
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_snapshot_picks_deepest_pair() {
        let pairs = sample_response().pairs.unwrap();
        let snapshot = MarketSnapshot::from_pairs(MINT, &pairs).unwrap();

        assert_eq!(snapshot.price_usd, 0.000021);
        assert_eq!(snapshot.market_cap, Some(1_400_000.0));
        assert_eq!(snapshot.liquidity_usd, 250_000.0);
        assert_eq!(snapshot.pair_created_at, Some(1_672_000_000_000));
        assert_eq!(snapshot.symbol.as_deref(), Some("Bonk"));
    }

    #[test]
    fn test_snapshot_ignores_quote_side_pairs() {
        let pairs = sample_response().pairs.unwrap();
        assert!(MarketSnapshot::from_pairs("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", &pairs).is_none());
        assert!(MarketSnapshot::from_pairs(MINT, &[]).is_none());
    }
}
