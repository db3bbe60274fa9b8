//! Holder Enrichment
//!
//! Turns ranked balances plus a bounded per-wallet transaction list into
//! typed `Holder` records. Per-holder fetches run with bounded concurrency
//! and keep the balance ranking. A wallet whose history cannot be fetched is
//! kept as a degraded holder instead of failing the scan.

use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::config::RetryPolicy;
use crate::models::errors::AppResult;
use crate::models::types::{Holder, HolderBalance, Transaction, TransactionKind, WalletLabel};
use crate::providers::gateway::TokenGateway;
use crate::utils::constants::{
    BOT_TX_THRESHOLD, BOT_WINDOW_SECS, DORMANT_SECS, FALLBACK_HOLD_SECS, FRESH_TX_THRESHOLD,
    PROFIT_LOSS_FACTOR,
};
use crate::utils::jitter::JitterSource;
use crate::utils::retry::with_retry;

/// Build a holder from its balance and resolved transactions (unix seconds)
pub fn enrich_holder(
    balance: &HolderBalance,
    transactions: &[Transaction],
    deployer: Option<&str>,
    now: i64,
) -> Holder {
    let wallet = balance.wallet_address.as_str();

    let bought: f64 = transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Buy)
        .map(|t| t.amount)
        .sum();
    let total_bought = if bought > 0.0 { bought } else { balance.balance };

    let total_sold: f64 = transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Sell)
        .map(|t| t.amount)
        .sum();

    let sold_percentage = if total_bought > 0.0 {
        total_sold * 100.0 / total_bought
    } else {
        0.0
    };

    let earliest = transactions.iter().min_by_key(|t| t.timestamp);
    let first_hold_time = earliest
        .map(|t| t.timestamp)
        .unwrap_or(now - FALLBACK_HOLD_SECS);
    let last_activity_time = transactions
        .iter()
        .map(|t| t.timestamp)
        .max()
        .unwrap_or(now);

    let profit_loss = (total_sold - total_bought) * PROFIT_LOSS_FACTOR;
    let profit_loss_percentage = if total_bought > 0.0 {
        profit_loss * 100.0 / total_bought
    } else {
        0.0
    };

    // Earliest inbound transaction initiated by someone else
    let mut chronological: Vec<&Transaction> = transactions.iter().collect();
    chronological.sort_by_key(|t| t.timestamp);
    let funder_address = chronological
        .iter()
        .find(|t| !t.from.is_empty() && t.from != wallet)
        .map(|t| t.from.clone());

    Holder {
        wallet_address: balance.wallet_address.clone(),
        balance: balance.balance,
        supply_percentage: 0.0,
        value_usd: 0.0,
        first_hold_time,
        hold_duration: (now - first_hold_time).max(0),
        total_bought,
        total_sold,
        sold_percentage,
        profit_loss,
        profit_loss_percentage,
        labels: wallet_labels(wallet, transactions, deployer, now),
        transaction_count: transactions.len() as u32,
        last_activity_time,
        connected_wallets: 0,
        first_slot: earliest.map(|t| t.slot),
        funder_address,
    }
}

/// Behavioural labels for a wallet
pub fn wallet_labels(
    wallet: &str,
    transactions: &[Transaction],
    deployer: Option<&str>,
    now: i64,
) -> Vec<WalletLabel> {
    let mut labels = Vec::new();

    if (transactions.len() as u32) < FRESH_TX_THRESHOLD {
        labels.push(WalletLabel::Fresh);
    }

    if transactions.len() >= BOT_TX_THRESHOLD {
        let mut times: Vec<i64> = transactions.iter().map(|t| t.timestamp).collect();
        times.sort_unstable();
        let burst = times
            .windows(BOT_TX_THRESHOLD)
            .any(|w| w[BOT_TX_THRESHOLD - 1] - w[0] < BOT_WINDOW_SECS);
        if burst {
            labels.push(WalletLabel::Bot);
        }
    }

    if let Some(last) = transactions.iter().map(|t| t.timestamp).max() {
        if now - last >= DORMANT_SECS {
            labels.push(WalletLabel::Dormant);
        }
    }

    if let Some(deployer) = deployer.filter(|d| !d.is_empty()) {
        let linked = wallet == deployer
            || transactions
                .iter()
                .any(|t| t.from == deployer || t.to == deployer);
        if linked {
            labels.push(WalletLabel::Named);
        }
    }

    labels
}

/// Second mutation pass: supply share and USD value once metadata is known
pub fn apply_market_data(holders: &mut [Holder], total_supply: f64, price: f64) {
    for holder in holders.iter_mut() {
        holder.supply_percentage = if total_supply > 0.0 {
            (holder.balance * 100.0 / total_supply).clamp(0.0, 100.0)
        } else {
            0.0
        };
        holder.value_usd = holder.balance * price;
    }
}

/// Enriched holders plus how many had to be degraded
#[derive(Debug, Clone, Default)]
pub struct EnrichmentOutcome {
    pub holders: Vec<Holder>,
    pub degraded: usize,
}

/// Fetches and enriches the top holders of a token
pub struct HolderEnricher {
    gateway: Arc<dyn TokenGateway>,
    retry: RetryPolicy,
    jitter: Arc<dyn JitterSource>,
    tx_history_limit: usize,
    concurrency: usize,
}

impl HolderEnricher {
    pub fn new(
        gateway: Arc<dyn TokenGateway>,
        retry: RetryPolicy,
        jitter: Arc<dyn JitterSource>,
        tx_history_limit: usize,
        concurrency: usize,
    ) -> Self {
        Self {
            gateway,
            retry,
            jitter,
            tx_history_limit,
            concurrency: concurrency.max(1),
        }
    }

    /// Ranked holders of `mint`, enriched. Errors only when the holder list itself fails.
    pub async fn fetch_holders(
        &self,
        mint: &str,
        limit: usize,
        deployer: Option<&str>,
    ) -> AppResult<EnrichmentOutcome> {
        let balances = with_retry("largest_holders", &self.retry, self.jitter.as_ref(), || {
            self.gateway.largest_holders(mint, limit)
        })
        .await?;

        let now = chrono::Utc::now().timestamp();
        let results: Vec<(Holder, bool)> = stream::iter(balances.into_iter().take(limit))
            .map(|balance| self.enrich_one(balance, mint, deployer, now))
            .buffered(self.concurrency)
            .collect()
            .await;

        let degraded = results.iter().filter(|(_, degraded)| *degraded).count();
        Ok(EnrichmentOutcome {
            holders: results.into_iter().map(|(holder, _)| holder).collect(),
            degraded,
        })
    }

    async fn enrich_one(
        &self,
        balance: HolderBalance,
        mint: &str,
        deployer: Option<&str>,
        now: i64,
    ) -> (Holder, bool) {
        let wallet = balance.wallet_address.as_str();
        let fetched = with_retry("wallet_transactions", &self.retry, self.jitter.as_ref(), || {
            self.gateway
                .wallet_transactions(wallet, mint, self.tx_history_limit)
        })
        .await;

        match fetched {
            Ok(transactions) => {
                debug!("👛 {} resolved {} transactions", wallet, transactions.len());
                (enrich_holder(&balance, &transactions, deployer, now), false)
            }
            Err(e) => {
                warn!("⚠️ Holder {} degraded, history unavailable: {}", wallet, e);
                (Holder::degraded(wallet, balance.balance, now), true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn tx(kind: TransactionKind, amount: f64, timestamp: i64, from: &str) -> Transaction {
        Transaction {
            signature: format!("sig-{}", timestamp),
            timestamp,
            kind,
            amount,
            from: from.to_string(),
            to: "holder".to_string(),
            slot: timestamp as u64,
        }
    }

    fn balance(amount: f64) -> HolderBalance {
        HolderBalance {
            wallet_address: "holder".to_string(),
            balance: amount,
        }
    }

    #[test]
    fn test_enrich_buys_and_sells() {
        let txs = vec![
            tx(TransactionKind::Sell, 30.0, NOW - 100, "holder"),
            tx(TransactionKind::Buy, 100.0, NOW - 3_600, "holder"),
            tx(TransactionKind::Transfer, 5.0, NOW - 7_200, "funder"),
        ];
        let holder = enrich_holder(&balance(70.0), &txs, None, NOW);

        assert_eq!(holder.total_bought, 100.0);
        assert_eq!(holder.total_sold, 30.0);
        assert_eq!(holder.sold_percentage, 30.0);
        assert_eq!(holder.profit_loss, -35.0);
        assert_eq!(holder.profit_loss_percentage, -35.0);
        assert_eq!(holder.first_hold_time, NOW - 7_200);
        assert_eq!(holder.hold_duration, 7_200);
        assert_eq!(holder.last_activity_time, NOW - 100);
        assert_eq!(holder.first_slot, Some((NOW - 7_200) as u64));
        assert_eq!(holder.funder_address.as_deref(), Some("funder"));
        assert_eq!(holder.transaction_count, 3);
        assert_eq!(holder.labels, vec![WalletLabel::Fresh]);
    }

    #[test]
    fn test_sold_percentage_is_exact_for_whole_shares() {
        for (sold, expected) in [(55.0, 55.0), (60.0, 60.0), (7.0, 7.0), (29.0, 29.0)] {
            let txs = vec![
                tx(TransactionKind::Buy, 100.0, NOW - 3_600, "holder"),
                tx(TransactionKind::Sell, sold, NOW - 60, "holder"),
            ];
            let holder = enrich_holder(&balance(100.0 - sold), &txs, None, NOW);
            assert_eq!(holder.sold_percentage, expected);
        }
    }

    #[test]
    fn test_no_history_uses_fallbacks() {
        let holder = enrich_holder(&balance(42.0), &[], None, NOW);

        assert_eq!(holder.total_bought, 42.0);
        assert_eq!(holder.sold_percentage, 0.0);
        assert_eq!(holder.first_hold_time, NOW - FALLBACK_HOLD_SECS);
        assert_eq!(holder.hold_duration, FALLBACK_HOLD_SECS);
        assert_eq!(holder.last_activity_time, NOW);
        assert!(holder.first_slot.is_none());
        assert!(holder.funder_address.is_none());
    }

    #[test]
    fn test_labels() {
        // 100 transactions inside 50 seconds, 8 days ago
        let base = NOW - 8 * 86_400;
        let burst: Vec<Transaction> = (0..100)
            .map(|i| tx(TransactionKind::Transfer, 1.0, base + i / 2, "deployer"))
            .collect();

        let labels = wallet_labels("holder", &burst, Some("deployer"), NOW);
        assert!(!labels.contains(&WalletLabel::Fresh));
        assert!(labels.contains(&WalletLabel::Bot));
        assert!(labels.contains(&WalletLabel::Dormant));
        assert!(labels.contains(&WalletLabel::Named));

        // Deployer wallet itself is NAMED even without history
        let labels = wallet_labels("deployer", &[], Some("deployer"), NOW);
        assert_eq!(labels, vec![WalletLabel::Fresh, WalletLabel::Named]);
    }

    #[test]
    fn test_slow_activity_is_not_bot() {
        let spread: Vec<Transaction> = (0..120)
            .map(|i| tx(TransactionKind::Transfer, 1.0, NOW - 10_000 + i * 10, "x"))
            .collect();
        let labels = wallet_labels("holder", &spread, None, NOW);
        assert!(!labels.contains(&WalletLabel::Bot));
    }

    #[test]
    fn test_apply_market_data() {
        let mut holders = vec![
            enrich_holder(&balance(250.0), &[], None, NOW),
            Holder::degraded("other", 2_000.0, NOW),
        ];
        apply_market_data(&mut holders, 1_000.0, 0.5);

        assert_eq!(holders[0].supply_percentage, 25.0);
        assert_eq!(holders[0].value_usd, 125.0);
        // clamped to 100
        assert_eq!(holders[1].supply_percentage, 100.0);

        apply_market_data(&mut holders, 0.0, 0.5);
        assert_eq!(holders[0].supply_percentage, 0.0);
    }
}
