//! Type definitions for Coal Scan
//! All core data structures for holder analysis and token scoring

use serde::{Deserialize, Serialize};

use crate::utils::constants::FALLBACK_HOLD_SECS;

/// Behavioural label attached to a holder wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletLabel {
    /// Fewer than 50 known transactions
    Fresh,
    /// 100+ transactions packed into a 60 second span
    Bot,
    /// No activity for 7+ days
    Dormant,
    /// Transaction-linked to the token deployer
    Named,
}

impl WalletLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletLabel::Fresh => "FRESH",
            WalletLabel::Bot => "BOT",
            WalletLabel::Dormant => "DORMANT",
            WalletLabel::Named => "NAMED",
        }
    }
}

/// Detected bundle pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BundleType {
    SameBlockBuy,
    SameFunder,
    CoordinatedSell,
}

impl BundleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleType::SameBlockBuy => "SAME_BLOCK_BUY",
            BundleType::SameFunder => "SAME_FUNDER",
            BundleType::CoordinatedSell => "COORDINATED_SELL",
        }
    }
}

/// Risk level classification for a scanned token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Extreme,
}

impl RiskLevel {
    /// Map a Coal Score onto its level (>=91 EXTREME, >=61 HIGH, >=38 MEDIUM)
    pub fn from_score(score: u8) -> Self {
        match score {
            91..=u8::MAX => RiskLevel::Extreme,
            61..=90 => RiskLevel::High,
            38..=60 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Extreme => "EXTREME",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::Low => "🟢",
            RiskLevel::Medium => "🟡",
            RiskLevel::High => "🔴",
            RiskLevel::Extreme => "💀",
        }
    }
}

// ============================================
// Gateway inputs
// ============================================

/// Direction of a wallet transaction relative to the scanned token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Buy,
    Sell,
    Transfer,
}

/// A resolved wallet transaction touching the scanned token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub signature: String,
    /// Unix seconds
    pub timestamp: i64,
    pub kind: TransactionKind,
    /// Token amount in UI units
    pub amount: f64,
    /// Initiator (fee payer) of the transaction
    pub from: String,
    /// Wallet the transaction was fetched for
    pub to: String,
    pub slot: u64,
}

/// One ranked entry from the holder list, before enrichment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolderBalance {
    pub wallet_address: String,
    /// Balance in UI units
    pub balance: f64,
}

/// Token metadata as supplied by the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Total supply in UI units
    pub supply: f64,
    pub market_cap: f64,
    pub price: f64,
    /// Token age in seconds
    pub age: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder_count: Option<u64>,
}

// ============================================
// Holders & Bundles
// ============================================

/// Enriched holder record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holder {
    pub wallet_address: String,
    pub balance: f64,
    /// Share of total supply, 0-100
    pub supply_percentage: f64,
    pub value_usd: f64,
    /// Unix seconds of the earliest resolved transaction (or the fallback)
    pub first_hold_time: i64,
    /// Seconds since first_hold_time
    pub hold_duration: i64,
    pub total_bought: f64,
    pub total_sold: f64,
    pub sold_percentage: f64,
    pub profit_loss: f64,
    pub profit_loss_percentage: f64,
    pub labels: Vec<WalletLabel>,
    pub transaction_count: u32,
    /// Unix seconds of the most recent resolved transaction
    pub last_activity_time: i64,
    pub connected_wallets: u32,
    /// Slot of the earliest resolved transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_slot: Option<u64>,
    /// Initiator of the earliest transaction not sent by the wallet itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funder_address: Option<String>,
}

impl Holder {
    /// Holder built when a wallet's history could not be fetched.
    ///
    /// Kept in the holder set (instead of dropped) so concentration math still
    /// sees its balance. Labelled FRESH with zero activity and the 1-day hold
    /// fallback.
    pub fn degraded(wallet_address: impl Into<String>, balance: f64, now: i64) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            balance,
            supply_percentage: 0.0,
            value_usd: 0.0,
            first_hold_time: now - FALLBACK_HOLD_SECS,
            hold_duration: FALLBACK_HOLD_SECS,
            total_bought: balance,
            total_sold: 0.0,
            sold_percentage: 0.0,
            profit_loss: 0.0,
            profit_loss_percentage: 0.0,
            labels: vec![WalletLabel::Fresh],
            transaction_count: 0,
            last_activity_time: now,
            connected_wallets: 0,
            first_slot: None,
            funder_address: None,
        }
    }

    pub fn has_label(&self, label: WalletLabel) -> bool {
        self.labels.contains(&label)
    }
}

/// Detected cluster of coordinated wallets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub bundle_id: String,
    #[serde(rename = "type")]
    pub bundle_type: BundleType,
    pub wallet_addresses: Vec<String>,
    pub total_supply_percentage: f64,
    pub detection_score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funder_address: Option<String>,
    /// Unix milliseconds
    pub detection_time: i64,
}

impl Bundle {
    pub fn size(&self) -> usize {
        self.wallet_addresses.len()
    }

    pub fn contains(&self, wallet: &str) -> bool {
        self.wallet_addresses.iter().any(|w| w == wallet)
    }
}

// ============================================
// Safety & Reputation inputs
// ============================================

/// Liquidity pool and authority state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LpSafety {
    pub is_burned: bool,
    pub mint_authority_disabled: bool,
    pub freeze_authority_disabled: bool,
    pub lp_burn_percentage: f64,
    /// Recomputed by the scorer from holders
    pub top_holders_risk: bool,
    /// Recomputed by the scorer from holders
    pub dev_linkage: bool,
    pub wash_trading_score: f64,
}

impl Default for LpSafety {
    /// No evidence of risk: LP burned, authorities revoked, no wash trading
    fn default() -> Self {
        Self {
            is_burned: true,
            mint_authority_disabled: true,
            freeze_authority_disabled: true,
            lp_burn_percentage: 100.0,
            top_holders_risk: false,
            dev_linkage: false,
            wash_trading_score: 0.0,
        }
    }
}

impl LpSafety {
    /// Pessimistic record echoed by the low market cap override when none was supplied
    pub fn unsafe_default() -> Self {
        Self {
            is_burned: false,
            mint_authority_disabled: false,
            freeze_authority_disabled: false,
            lp_burn_percentage: 0.0,
            top_holders_risk: true,
            dev_linkage: true,
            wash_trading_score: 50.0,
        }
    }
}

/// Deployer launch history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevReputation {
    pub deployer_address: String,
    pub total_launched: u32,
    pub rug_count: u32,
    pub success_count: u32,
    /// 0-100
    pub reputation_score: f64,
    pub is_serial_rugger: bool,
}

impl DevReputation {
    /// Build a reputation record with all derived fields consistent
    pub fn from_history(deployer_address: impl Into<String>, total_launched: u32, rug_count: u32) -> Self {
        let rug_count = rug_count.min(total_launched);
        let success_count = total_launched - rug_count;
        let reputation_score = if total_launched == 0 {
            100.0
        } else {
            success_count as f64 * 100.0 / total_launched as f64
        };
        let is_serial_rugger = rug_count >= 3
            || (total_launched > 2 && rug_count as f64 / total_launched as f64 > 0.7);

        Self {
            deployer_address: deployer_address.into(),
            total_launched,
            rug_count,
            success_count,
            reputation_score,
            is_serial_rugger,
        }
    }

    /// Fallback used when the reputation lookup fails (neutral score of 50)
    pub fn unknown() -> Self {
        Self {
            reputation_score: 50.0,
            ..Self::from_history("Unknown", 0, 0)
        }
    }

    /// Pessimistic record echoed by the low market cap override when none was supplied
    pub fn unknown_rugger() -> Self {
        Self {
            deployer_address: "Unknown".to_string(),
            total_launched: 0,
            rug_count: 0,
            success_count: 0,
            reputation_score: 0.0,
            is_serial_rugger: true,
        }
    }
}

impl Default for DevReputation {
    fn default() -> Self {
        Self::from_history("Unknown", 0, 0)
    }
}

// ============================================
// Scoring output
// ============================================

/// Token-age bucket selecting the weight profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeightBucket {
    /// Younger than 1 hour
    Newborn,
    /// Younger than 24 hours
    Early,
    #[default]
    Mature,
}

/// Weights applied to the base score components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightProfile {
    pub hold_time: f64,
    pub concentration: f64,
    pub connection: f64,
    pub safety_multiplier: f64,
    pub dev_history_weight: f64,
}

impl WeightProfile {
    pub const NEWBORN: Self = Self {
        hold_time: 0.1,
        concentration: 0.2,
        connection: 0.7,
        safety_multiplier: 1.5,
        dev_history_weight: 0.25,
    };
    pub const EARLY: Self = Self {
        hold_time: 0.25,
        concentration: 0.35,
        connection: 0.4,
        safety_multiplier: 1.2,
        dev_history_weight: 0.15,
    };
    pub const MATURE: Self = Self {
        hold_time: 0.5,
        concentration: 0.3,
        connection: 0.2,
        safety_multiplier: 1.0,
        dev_history_weight: 0.1,
    };
}

impl WeightBucket {
    pub fn for_age(token_age_secs: i64) -> Self {
        if token_age_secs < 3_600 {
            WeightBucket::Newborn
        } else if token_age_secs < 86_400 {
            WeightBucket::Early
        } else {
            WeightBucket::Mature
        }
    }

    pub fn profile(&self) -> WeightProfile {
        match self {
            WeightBucket::Newborn => WeightProfile::NEWBORN,
            WeightBucket::Early => WeightProfile::EARLY,
            WeightBucket::Mature => WeightProfile::MATURE,
        }
    }
}

impl Default for WeightProfile {
    fn default() -> Self {
        Self::MATURE
    }
}

/// Per-component score breakdown
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub hold_time_score: f64,
    pub concentration_score: f64,
    pub wallet_connection_score: f64,
    pub base_score: f64,
    pub red_flag_bonus: f64,
    pub sell_bonus: f64,
    pub age_penalty: f64,
    pub maturity_bonus: f64,
    pub lp_penalty: f64,
    pub dev_penalty: f64,
    pub weight_bucket: WeightBucket,
    pub weights: WeightProfile,
}

/// Red flag categories, one per scoring rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedFlagType {
    SerialRugger,
    BadDevHistory,
    LpNotBurned,
    MintEnabled,
    FreezeEnabled,
    DevLinkage,
    WashTrading,
    Concentration,
    LargeFreshHolders,
    Bundle,
    Sell,
    Age,
    LowMarketCap,
}

/// Human-readable explanation of one score contribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedFlag {
    #[serde(rename = "type")]
    pub flag_type: RedFlagType,
    pub description: String,
    pub score: f64,
}

impl RedFlag {
    pub fn new(flag_type: RedFlagType, description: impl Into<String>, score: f64) -> Self {
        Self {
            flag_type,
            description: description.into(),
            score,
        }
    }
}

/// Final scan result; the cached unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenScanResult {
    pub contract_address: String,
    /// Unix milliseconds
    pub scan_timestamp: i64,
    pub coal_score: u8,
    pub risk_level: RiskLevel,
    pub market_cap: f64,
    pub token_age: i64,
    pub score_breakdown: ScoreBreakdown,
    pub holders: Vec<Holder>,
    pub bundles: Vec<Bundle>,
    pub red_flags: Vec<RedFlag>,
    pub lp_safety: LpSafety,
    pub dev_reputation: DevReputation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TokenMetadata>,
}

/// Cache status for an address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStatus {
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_thresholds() {
        assert_eq!(RiskLevel::from_score(100), RiskLevel::Extreme);
        assert_eq!(RiskLevel::from_score(91), RiskLevel::Extreme);
        assert_eq!(RiskLevel::from_score(90), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(61), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(60), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(38), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(37), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
    }

    #[test]
    fn test_dev_reputation_derivation() {
        let fresh = DevReputation::from_history("dev", 0, 0);
        assert_eq!(fresh.reputation_score, 100.0);
        assert!(!fresh.is_serial_rugger);

        let rugger = DevReputation::from_history("dev", 10, 3);
        assert_eq!(rugger.success_count, 7);
        assert!(rugger.is_serial_rugger);

        // 2/3 rugged is below the 0.7 ratio and below 3 rugs
        let borderline = DevReputation::from_history("dev", 3, 2);
        assert!(!borderline.is_serial_rugger);
        assert!((borderline.reputation_score - 33.333).abs() < 0.01);
    }

    #[test]
    fn test_weight_bucket_boundaries() {
        assert_eq!(WeightBucket::for_age(3_599), WeightBucket::Newborn);
        assert_eq!(WeightBucket::for_age(3_600), WeightBucket::Early);
        assert_eq!(WeightBucket::for_age(86_399), WeightBucket::Early);
        assert_eq!(WeightBucket::for_age(86_400), WeightBucket::Mature);
    }

    #[test]
    fn test_wire_format() {
        let flag = RedFlag::new(RedFlagType::LowMarketCap, "low", 90.0);
        let json = serde_json::to_value(&flag).unwrap();
        assert_eq!(json["type"], "LOW_MARKET_CAP");

        let holder = Holder::degraded("wallet", 10.0, 1_000_000);
        let json = serde_json::to_value(&holder).unwrap();
        assert_eq!(json["walletAddress"], "wallet");
        assert_eq!(json["labels"][0], "FRESH");
        assert!(json.get("funderAddress").is_none());
    }
}
