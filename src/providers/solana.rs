//! Solana Provider Module
//!
//! `TokenGateway` over standard Solana JSON-RPC plus DexScreener market data:
//! - getTokenSupply / getAccountInfo (jsonParsed): supply, decimals, authorities
//! - getTokenLargestAccounts + getMultipleAccounts: ranked holders resolved to owners
//! - getSignaturesForAddress + getTransaction (jsonParsed): per-holder history
//!
//! Known limits of plain RPC:
//! - LP burn state is not resolvable, reported as not burned (0%)
//! - wash trading is not measured (score 0)
//! - deployer history is not indexed, the deployer is reported with no launches
//! - buy/sell is inferred from token balance deltas and the fee payer

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{
    DevReputation, HolderBalance, LpSafety, TokenMetadata, Transaction, TransactionKind,
};
use crate::providers::dexscreener::{DexScreenerClient, MarketSnapshot};
use crate::providers::gateway::TokenGateway;
use crate::providers::rpc::RpcClient;
use crate::utils::constants::{TOKEN_ACCOUNT_MEMO_CAPACITY, TOKEN_ACCOUNT_TTL_SECS};

// ============================================
// SOLANA CONSTANTS
// ============================================

/// Signature page used to locate the mint's first transaction
const MINT_SIGNATURE_PAGE: usize = 1_000;

/// Concurrent getTransaction calls per wallet
const TX_FETCH_CONCURRENCY: usize = 4;

// ============================================
// SOLANA RPC TYPES
// ============================================

/// `{ context, value }` envelope
#[derive(Debug, Deserialize)]
struct RpcValue<T> {
    value: T,
}

/// Token amount
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAmount {
    pub amount: String,
    pub decimals: u8,
    pub ui_amount: Option<f64>,
    #[serde(default)]
    pub ui_amount_string: Option<String>,
}

impl TokenAmount {
    /// UI amount, falling back to the string form (uiAmount is null for zero)
    pub fn ui(&self) -> f64 {
        self.ui_amount
            .or_else(|| self.ui_amount_string.as_deref().and_then(|s| s.parse().ok()))
            .unwrap_or(0.0)
    }
}

/// Entry of getTokenLargestAccounts
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LargestAccount {
    pub address: String,
    #[serde(flatten)]
    pub amount: TokenAmount,
}

/// Entry of getSignaturesForAddress
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    pub signature: String,
    pub slot: u64,
    pub block_time: Option<i64>,
    pub err: Option<Value>,
}

/// getTransaction result (jsonParsed)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolanaTransaction {
    pub slot: u64,
    pub block_time: Option<i64>,
    pub meta: Option<TransactionMeta>,
    pub transaction: TransactionData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionData {
    pub signatures: Vec<String>,
    pub message: TransactionMessage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMessage {
    pub account_keys: Vec<AccountKey>,
}

/// Account key: plain string (json) or object (jsonParsed)
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AccountKey {
    Parsed { pubkey: String },
    Plain(String),
}

impl AccountKey {
    pub fn pubkey(&self) -> &str {
        match self {
            AccountKey::Parsed { pubkey } => pubkey,
            AccountKey::Plain(key) => key,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    pub err: Option<Value>,
    #[serde(default)]
    pub pre_token_balances: Option<Vec<SolanaTokenBalance>>,
    #[serde(default)]
    pub post_token_balances: Option<Vec<SolanaTokenBalance>>,
}

/// Token balance in transaction
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolanaTokenBalance {
    pub account_index: u32,
    pub mint: String,
    pub owner: Option<String>,
    pub ui_token_amount: TokenAmount,
}

/// Parsed SPL mint account
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintInfo {
    pub mint_authority: Option<String>,
    pub freeze_authority: Option<String>,
    pub decimals: u8,
    pub supply: String,
}

// ============================================
// BALANCE DELTA CLASSIFICATION
// ============================================

/// Net token change for `owner` on `mint` across a transaction
pub fn token_delta(
    pre: &[SolanaTokenBalance],
    post: &[SolanaTokenBalance],
    owner: &str,
    mint: &str,
) -> f64 {
    let sum = |balances: &[SolanaTokenBalance]| -> f64 {
        balances
            .iter()
            .filter(|b| b.mint == mint && b.owner.as_deref() == Some(owner))
            .map(|b| b.ui_token_amount.ui())
            .sum()
    };
    sum(post) - sum(pre)
}

/// Classify a wallet's token movement.
///
/// The wallet paying the fee and receiving tokens is a buy, paying and
/// losing tokens a sell. Anything initiated by someone else is a transfer.
pub fn classify_delta(delta: f64, fee_payer: &str, wallet: &str) -> TransactionKind {
    let initiated = fee_payer == wallet;
    if initiated && delta > 0.0 {
        TransactionKind::Buy
    } else if initiated && delta < 0.0 {
        TransactionKind::Sell
    } else {
        TransactionKind::Transfer
    }
}

impl SolanaTransaction {
    pub fn fee_payer(&self) -> Option<&str> {
        self.transaction.message.account_keys.first().map(|k| k.pubkey())
    }

    /// Reduce to the gateway transaction type from `wallet`'s point of view
    pub fn to_transaction(&self, wallet: &str, mint: &str) -> Transaction {
        let (pre, post) = match &self.meta {
            Some(meta) => (
                meta.pre_token_balances.as_deref().unwrap_or(&[]),
                meta.post_token_balances.as_deref().unwrap_or(&[]),
            ),
            None => (&[][..], &[][..]),
        };
        let delta = token_delta(pre, post, wallet, mint);
        let fee_payer = self.fee_payer().unwrap_or_default();

        Transaction {
            signature: self.transaction.signatures.first().cloned().unwrap_or_default(),
            timestamp: self.block_time.unwrap_or_else(|| chrono::Utc::now().timestamp()),
            kind: classify_delta(delta, fee_payer, wallet),
            amount: delta.abs(),
            from: fee_payer.to_string(),
            to: wallet.to_string(),
            slot: self.slot,
        }
    }
}

// ============================================
// TOKEN ACCOUNT MEMO
// ============================================

/// `{mint}:{owner}` -> largest token account, filled by `largest_holders`.
/// Entries expire after a TTL and the map is swept once it reaches capacity.
struct TokenAccountMemo {
    entries: DashMap<String, (String, Instant)>,
    ttl: Duration,
    capacity: usize,
}

impl TokenAccountMemo {
    fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            capacity,
        }
    }

    fn key(mint: &str, owner: &str) -> String {
        format!("{}:{}", mint, owner)
    }

    fn get(&self, mint: &str, owner: &str) -> Option<String> {
        let key = Self::key(mint, owner);
        let hit = self
            .entries
            .get(&key)
            .and_then(|entry| (entry.1.elapsed() < self.ttl).then(|| entry.0.clone()));
        if hit.is_none() {
            let ttl = self.ttl;
            self.entries.remove_if(&key, |_, (_, at)| at.elapsed() >= ttl);
        }
        hit
    }

    fn insert(&self, mint: &str, owner: &str, account: &str) {
        if self.entries.len() >= self.capacity {
            let ttl = self.ttl;
            self.entries.retain(|_, (_, at)| at.elapsed() < ttl);
            if self.entries.len() >= self.capacity {
                debug!("🧹 Token account memo full ({}), clearing", self.entries.len());
                self.entries.clear();
            }
        }
        self.entries
            .entry(Self::key(mint, owner))
            .or_insert_with(|| (account.to_string(), Instant::now()));
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

// ============================================
// SOLANA GATEWAY
// ============================================

pub struct SolanaGateway {
    rpc: RpcClient,
    market: DexScreenerClient,
    token_accounts: TokenAccountMemo,
}

impl SolanaGateway {
    pub fn new(rpc_url: &str, price_api_url: &str, timeout: Duration) -> AppResult<Self> {
        let rpc = RpcClient::new(rpc_url, timeout)?;
        info!("🌐 Solana gateway using {}", rpc.masked_url());
        Ok(Self {
            rpc,
            market: DexScreenerClient::new(price_api_url, timeout)?,
            token_accounts: TokenAccountMemo::new(
                Duration::from_secs(TOKEN_ACCOUNT_TTL_SECS),
                TOKEN_ACCOUNT_MEMO_CAPACITY,
            ),
        })
    }

    /// Parsed mint account, `None` when it does not exist
    async fn mint_info(&self, mint: &str) -> AppResult<Option<MintInfo>> {
        let result: RpcValue<Option<Value>> = self
            .rpc
            .call("getAccountInfo", json!([mint, {"encoding": "jsonParsed"}]))
            .await?;

        let Some(account) = result.value else {
            return Ok(None);
        };
        let info = account
            .pointer("/data/parsed/info")
            .cloned()
            .ok_or_else(|| AppError::token_not_found(format!("{} is not an SPL mint", mint)))?;
        Ok(Some(serde_json::from_value(info)?))
    }

    async fn signatures(&self, address: &str, limit: usize) -> AppResult<Vec<SignatureInfo>> {
        self.rpc
            .call(
                "getSignaturesForAddress",
                json!([address, {"limit": limit.max(1), "commitment": "confirmed"}]),
            )
            .await
    }

    async fn transaction(&self, signature: &str) -> AppResult<SolanaTransaction> {
        self.rpc
            .call(
                "getTransaction",
                json!([signature, {
                    "encoding": "jsonParsed",
                    "maxSupportedTransactionVersion": 0,
                    "commitment": "confirmed"
                }]),
            )
            .await
    }

    /// Oldest signature reachable in one page of the mint's history
    async fn oldest_mint_signature(&self, mint: &str) -> AppResult<Option<SignatureInfo>> {
        let mut page = self.signatures(mint, MINT_SIGNATURE_PAGE).await?;
        Ok(page.pop())
    }

    async fn market_snapshot(&self, mint: &str) -> Option<MarketSnapshot> {
        match self.market.market_snapshot(mint).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("⚠️ Market data unavailable for {}: {}", mint, e);
                None
            }
        }
    }

    /// Token age in seconds from the pair creation time or the oldest mint signature
    async fn token_age(&self, mint: &str, snapshot: Option<&MarketSnapshot>, now: i64) -> i64 {
        if let Some(created_ms) = snapshot.and_then(|s| s.pair_created_at) {
            return (now - created_ms / 1_000).max(0);
        }
        match self.oldest_mint_signature(mint).await {
            Ok(Some(sig)) => sig.block_time.map(|t| (now - t).max(0)).unwrap_or(0),
            Ok(None) => 0,
            Err(e) => {
                warn!("⚠️ Could not resolve age of {}: {}", mint, e);
                0
            }
        }
    }

    /// Resolve token accounts to their owner wallets (jsonParsed)
    async fn resolve_owners(&self, token_accounts: &[String]) -> AppResult<Vec<Option<String>>> {
        let result: RpcValue<Vec<Option<Value>>> = self
            .rpc
            .call(
                "getMultipleAccounts",
                json!([token_accounts, {"encoding": "jsonParsed"}]),
            )
            .await?;

        Ok(result
            .value
            .into_iter()
            .map(|account| {
                account
                    .as_ref()
                    .and_then(|a| a.pointer("/data/parsed/info/owner"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .collect())
    }

    /// Token account holding `mint` for `owner`
    async fn token_account_for(&self, owner: &str, mint: &str) -> AppResult<Option<String>> {
        if let Some(account) = self.token_accounts.get(mint, owner) {
            return Ok(Some(account));
        }

        let result: RpcValue<Vec<Value>> = self
            .rpc
            .call(
                "getTokenAccountsByOwner",
                json!([owner, {"mint": mint}, {"encoding": "jsonParsed"}]),
            )
            .await?;

        Ok(result
            .value
            .iter()
            .find_map(|entry| entry.get("pubkey").and_then(Value::as_str))
            .map(str::to_string))
    }
}

#[async_trait]
impl TokenGateway for SolanaGateway {
    async fn token_metadata(&self, address: &str) -> AppResult<Option<TokenMetadata>> {
        let supply: RpcValue<TokenAmount> = match self
            .rpc
            .call("getTokenSupply", json!([address]))
            .await
        {
            Ok(supply) => supply,
            Err(e) if e.code == ErrorCode::TokenNotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let now = chrono::Utc::now().timestamp();
        let snapshot = self.market_snapshot(address).await;
        let supply_ui = supply.value.ui();
        let price = snapshot.as_ref().map(|s| s.price_usd).unwrap_or(0.0);
        let market_cap = snapshot
            .as_ref()
            .and_then(|s| s.market_cap)
            .unwrap_or(price * supply_ui);
        let age = self.token_age(address, snapshot.as_ref(), now).await;

        debug!(
            "🪙 {} supply={} price={} mcap={} age={}s",
            address, supply_ui, price, market_cap, age
        );

        Ok(Some(TokenMetadata {
            address: address.to_string(),
            name: snapshot
                .as_ref()
                .and_then(|s| s.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            symbol: snapshot
                .as_ref()
                .and_then(|s| s.symbol.clone())
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            decimals: supply.value.decimals,
            supply: supply_ui,
            market_cap,
            price,
            age,
            holder_count: None,
        }))
    }

    async fn largest_holders(&self, address: &str, limit: usize) -> AppResult<Vec<HolderBalance>> {
        let result: RpcValue<Vec<LargestAccount>> = self
            .rpc
            .call(
                "getTokenLargestAccounts",
                json!([address, {"commitment": "confirmed"}]),
            )
            .await?;

        let accounts: Vec<LargestAccount> = result
            .value
            .into_iter()
            .filter(|a| a.amount.ui() > 0.0)
            .collect();
        if accounts.is_empty() {
            return Ok(Vec::new());
        }

        let addresses: Vec<String> = accounts.iter().map(|a| a.address.clone()).collect();
        let owners = match self.resolve_owners(&addresses).await {
            Ok(owners) => owners,
            Err(e) => {
                warn!("⚠️ Owner resolution failed for {}, using token accounts: {}", address, e);
                vec![None; addresses.len()]
            }
        };

        // One wallet can hold several token accounts
        let mut holders: Vec<HolderBalance> = Vec::with_capacity(accounts.len());
        for (account, owner) in accounts.iter().zip(owners) {
            let wallet = owner.unwrap_or_else(|| account.address.clone());
            self.token_accounts.insert(address, &wallet, &account.address);

            match holders.iter_mut().find(|h| h.wallet_address == wallet) {
                Some(existing) => existing.balance += account.amount.ui(),
                None => holders.push(HolderBalance {
                    wallet_address: wallet,
                    balance: account.amount.ui(),
                }),
            }
        }

        holders.sort_by(|a, b| {
            b.balance
                .partial_cmp(&a.balance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        holders.truncate(limit);
        Ok(holders)
    }

    async fn wallet_transactions(
        &self,
        wallet: &str,
        mint: &str,
        limit: usize,
    ) -> AppResult<Vec<Transaction>> {
        // History of the token account only contains this mint's movements
        let history_address = self
            .token_account_for(wallet, mint)
            .await?
            .unwrap_or_else(|| wallet.to_string());

        let signatures = self.signatures(&history_address, limit).await?;

        let fetched: Vec<Option<Transaction>> = stream::iter(signatures)
            .filter(|sig| std::future::ready(sig.err.is_none()))
            .map(|sig| async move {
                match self.transaction(&sig.signature).await {
                    Ok(tx) => Some(tx.to_transaction(wallet, mint)),
                    Err(e) => {
                        debug!("⏭️ Skipping transaction {}: {}", sig.signature, e);
                        None
                    }
                }
            })
            .buffered(TX_FETCH_CONCURRENCY)
            .collect()
            .await;

        let mut transactions: Vec<Transaction> = fetched.into_iter().flatten().collect();
        transactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(transactions)
    }

    async fn lp_safety(&self, address: &str) -> AppResult<LpSafety> {
        let mint = self
            .mint_info(address)
            .await?
            .ok_or_else(|| AppError::token_not_found(format!("Mint {} not found", address)))?;

        Ok(LpSafety {
            is_burned: false,
            mint_authority_disabled: mint.mint_authority.is_none(),
            freeze_authority_disabled: mint.freeze_authority.is_none(),
            lp_burn_percentage: 0.0,
            top_holders_risk: false,
            dev_linkage: false,
            wash_trading_score: 0.0,
        })
    }

    async fn dev_reputation(&self, address: &str) -> AppResult<DevReputation> {
        let mint_authority = self.mint_info(address).await?.and_then(|m| m.mint_authority);

        let deployer = match mint_authority {
            Some(authority) => Some(authority),
            None => match self.oldest_mint_signature(address).await? {
                Some(sig) => self
                    .transaction(&sig.signature)
                    .await?
                    .fee_payer()
                    .map(str::to_string),
                None => None,
            },
        };

        Ok(match deployer {
            Some(deployer) => DevReputation::from_history(deployer, 0, 0),
            None => DevReputation::unknown(),
        })
    }

    fn name(&self) -> &'static str {
        "solana-rpc"
    }
}
