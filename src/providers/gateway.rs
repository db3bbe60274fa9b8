//! Chain/Market Data Gateway contract
//!
//! Everything the scanner needs from the outside world goes through this
//! trait. Calls may fail, rate-limit or return partial data; the scanner
//! decides which failures are fatal.

use async_trait::async_trait;

use crate::models::errors::AppResult;
use crate::models::types::{DevReputation, HolderBalance, LpSafety, TokenMetadata, Transaction};

#[async_trait]
pub trait TokenGateway: Send + Sync {
    /// Token metadata, `None` when the token does not exist
    async fn token_metadata(&self, address: &str) -> AppResult<Option<TokenMetadata>>;

    /// Up to `limit` holders ranked by balance, descending. Gaps are tolerated.
    async fn largest_holders(&self, address: &str, limit: usize) -> AppResult<Vec<HolderBalance>>;

    /// Most recent transactions of `wallet` touching `mint`, newest first
    async fn wallet_transactions(
        &self,
        wallet: &str,
        mint: &str,
        limit: usize,
    ) -> AppResult<Vec<Transaction>>;

    /// LP and authority state
    async fn lp_safety(&self, address: &str) -> AppResult<LpSafety>;

    /// Deployer launch history
    async fn dev_reputation(&self, address: &str) -> AppResult<DevReputation>;

    /// Gateway name for logs
    fn name(&self) -> &'static str;
}
