//! Bundle Detector
//!
//! Groups enriched holders into suspicious clusters with three independent
//! passes (same-block buy, same funder, coordinated sell). A holder may sit
//! in several bundles. Groups are visited in ascending key order so the
//! output is reproducible.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::models::types::{Bundle, BundleType, Holder};
use crate::utils::constants::{
    FUNDER_PREFIX_LEN, MIN_COORDINATED_SELL_BUNDLE, MIN_SAME_BLOCK_BUNDLE, MIN_SAME_FUNDER_BUNDLE,
    SELLER_THRESHOLD_PCT, SELL_WINDOW_SECS,
};
use crate::utils::jitter::{JitterSource, ThreadRngJitter};

/// Same-block bundles score 15 plus jitter in [0, 10)
const SAME_BLOCK_BASE_SCORE: f64 = 15.0;
const SAME_BLOCK_JITTER: f64 = 10.0;
const SAME_FUNDER_SCORE: u32 = 15;
const SAME_FUNDER_LARGE_SCORE: u32 = 25;
const SAME_FUNDER_LARGE_SIZE: usize = 5;
const COORDINATED_SELL_SCORE: u32 = 20;

pub struct BundleDetector {
    jitter: Arc<dyn JitterSource>,
}

impl Default for BundleDetector {
    fn default() -> Self {
        Self::new(Arc::new(ThreadRngJitter))
    }
}

impl BundleDetector {
    pub fn new(jitter: Arc<dyn JitterSource>) -> Self {
        Self { jitter }
    }

    /// Run all passes. `now_ms` stamps `detectionTime`.
    pub fn detect(&self, holders: &[Holder], now_ms: i64) -> Vec<Bundle> {
        let mut bundles = self.detect_same_block(holders, now_ms);
        bundles.extend(self.detect_same_funder(holders, now_ms));
        bundles.extend(self.detect_coordinated_sells(holders, now_ms));

        debug!("🔗 Detected {} bundles across {} holders", bundles.len(), holders.len());
        bundles
    }

    /// Holders whose first buy landed in the same slot (or the same second
    /// when no slot is known). Holders without any resolved transaction are
    /// left out.
    pub fn detect_same_block(&self, holders: &[Holder], now_ms: i64) -> Vec<Bundle> {
        let mut groups: BTreeMap<BlockKey, Vec<&Holder>> = BTreeMap::new();
        for holder in holders {
            if let Some(key) = BlockKey::of(holder) {
                groups.entry(key).or_default().push(holder);
            }
        }

        groups
            .into_iter()
            .filter(|(_, members)| members.len() >= MIN_SAME_BLOCK_BUNDLE)
            .map(|(key, members)| {
                let score = SAME_BLOCK_BASE_SCORE + self.jitter.range(0.0, SAME_BLOCK_JITTER);
                let mut bundle = build_bundle(
                    BundleType::SameBlockBuy,
                    key.id(),
                    &members,
                    score.floor() as u32,
                    now_ms,
                );
                bundle.block_height = Some(key.height());
                bundle
            })
            .collect()
    }

    /// Holders funded by the same wallet. Without a resolved funder the
    /// first characters of the address stand in for it.
    pub fn detect_same_funder(&self, holders: &[Holder], now_ms: i64) -> Vec<Bundle> {
        let mut groups: BTreeMap<String, Vec<&Holder>> = BTreeMap::new();
        for holder in holders {
            let key = holder
                .funder_address
                .clone()
                .unwrap_or_else(|| address_prefix(&holder.wallet_address));
            groups.entry(key).or_default().push(holder);
        }

        groups
            .into_iter()
            .filter(|(_, members)| members.len() >= MIN_SAME_FUNDER_BUNDLE)
            .map(|(funder, members)| {
                let mut bundle = build_bundle(
                    BundleType::SameFunder,
                    funder.clone(),
                    &members,
                    same_funder_score(members.len()),
                    now_ms,
                );
                bundle.funder_address = Some(funder);
                bundle
            })
            .collect()
    }

    /// Holders that sold at least half of their position within the same minute
    pub fn detect_coordinated_sells(&self, holders: &[Holder], now_ms: i64) -> Vec<Bundle> {
        let mut groups: BTreeMap<i64, Vec<&Holder>> = BTreeMap::new();
        for holder in holders
            .iter()
            .filter(|h| h.sold_percentage >= SELLER_THRESHOLD_PCT)
        {
            let window = holder.last_activity_time.div_euclid(SELL_WINDOW_SECS);
            groups.entry(window).or_default().push(holder);
        }

        groups
            .into_iter()
            .filter(|(_, members)| members.len() >= MIN_COORDINATED_SELL_BUNDLE)
            .map(|(window, members)| {
                build_bundle(
                    BundleType::CoordinatedSell,
                    window.to_string(),
                    &members,
                    COORDINATED_SELL_SCORE,
                    now_ms,
                )
            })
            .collect()
    }
}

/// Same-block grouping key. Real slots and pseudo-blocks never share a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum BlockKey {
    Slot(u64),
    Second(i64),
}

impl BlockKey {
    fn of(holder: &Holder) -> Option<Self> {
        match holder.first_slot {
            Some(slot) => Some(BlockKey::Slot(slot)),
            None if holder.transaction_count > 0 => Some(BlockKey::Second(holder.first_hold_time)),
            None => None,
        }
    }

    fn id(&self) -> String {
        match self {
            BlockKey::Slot(slot) => slot.to_string(),
            BlockKey::Second(secs) => format!("t{}", secs),
        }
    }

    fn height(&self) -> u64 {
        match self {
            BlockKey::Slot(slot) => *slot,
            BlockKey::Second(secs) => (*secs).max(0) as u64,
        }
    }
}

/// Same-funder contribution, shared with the wallet connection score
pub fn same_funder_score(size: usize) -> u32 {
    if size >= SAME_FUNDER_LARGE_SIZE {
        SAME_FUNDER_LARGE_SCORE
    } else {
        SAME_FUNDER_SCORE
    }
}

fn address_prefix(address: &str) -> String {
    address.chars().take(FUNDER_PREFIX_LEN).collect()
}

fn build_bundle(
    bundle_type: BundleType,
    key: String,
    members: &[&Holder],
    detection_score: u32,
    now_ms: i64,
) -> Bundle {
    Bundle {
        bundle_id: format!("{}-{}", bundle_type.as_str(), key),
        bundle_type,
        wallet_addresses: members.iter().map(|h| h.wallet_address.clone()).collect(),
        total_supply_percentage: members.iter().map(|h| h.supply_percentage).sum(),
        detection_score,
        block_height: None,
        funder_address: None,
        detection_time: now_ms,
    }
}

/// Second mutation pass: each holder's `connectedWallets` is the sum over
/// the bundles it belongs to of (bundle size - 1)
pub fn apply_connections(holders: &mut [Holder], bundles: &[Bundle]) {
    for holder in holders.iter_mut() {
        holder.connected_wallets = bundles
            .iter()
            .filter(|b| b.contains(&holder.wallet_address))
            .map(|b| b.size().saturating_sub(1) as u32)
            .sum();
    }
}
