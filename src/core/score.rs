//! Coal Score Calculator
//!
//! Pure reduction of holders, bundles, market cap, token age, LP safety and
//! deployer reputation into a 0-100 score, a breakdown and a red flag list.
//!
//! Every rule goes through `RuleLedger`, which records the contribution and
//! the matching red flag in the same step, so a flag's score is always the
//! exact amount its rule added.
//!
//! Score bands:
//! - 0-37: LOW
//! - 38-60: MEDIUM
//! - 61-90: HIGH
//! - 91-100: EXTREME (also the fixed result below $15k market cap)

use tracing::debug;

use crate::core::bundle_detector::same_funder_score;
use crate::models::types::{
    Bundle, BundleType, DevReputation, Holder, LpSafety, RedFlag, RedFlagType, RiskLevel,
    ScoreBreakdown, TokenMetadata, TokenScanResult, WalletLabel, WeightBucket, WeightProfile,
};
use crate::utils::constants::{
    CONCENTRATION_TOP_N, LARGE_FRESH_HOLD_SECS, LARGE_HOLDER_PCT, LOW_MARKET_CAP_SCORE,
    LOW_MARKET_CAP_USD, MATURITY_AGE_SECS, RED_FLAG_BONUS_CAP, SECS_PER_DAY, SECS_PER_HOUR,
    SELLER_THRESHOLD_PCT, SELL_BONUS_CAP, TOP10_RISK_THRESHOLD,
};

/// Everything the calculator reads
#[derive(Debug, Clone)]
pub struct ScoreInput {
    pub contract_address: String,
    /// Unix milliseconds
    pub scan_timestamp: i64,
    pub holders: Vec<Holder>,
    pub bundles: Vec<Bundle>,
    pub market_cap: f64,
    /// Seconds
    pub token_age: i64,
    /// `None` falls back to `LpSafety::default()`, or the pessimistic record under the override
    pub lp_safety: Option<LpSafety>,
    /// `None` falls back to `DevReputation::unknown()`, or the pessimistic record under the override
    pub dev_reputation: Option<DevReputation>,
    pub metadata: Option<TokenMetadata>,
}

// ============================================
// Rule ledger
// ============================================

/// Collects red flags alongside the contributions that produced them
#[derive(Debug, Default)]
struct RuleLedger {
    flags: Vec<RedFlag>,
}

impl RuleLedger {
    /// Record a contribution, raising a flag when it is positive. Returns the amount.
    fn add(&mut self, flag_type: RedFlagType, amount: f64, description: impl Into<String>) -> f64 {
        if amount > 0.0 {
            self.flags.push(RedFlag::new(flag_type, description, amount));
        }
        amount
    }

    /// Like `add`, but clipped to what is left under `cap` after `used`
    fn add_capped(
        &mut self,
        flag_type: RedFlagType,
        raw: f64,
        used: f64,
        cap: f64,
        description: impl Into<String>,
    ) -> f64 {
        let amount = raw.min((cap - used).max(0.0));
        self.add(flag_type, amount, description)
    }
}

fn fmt_points(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

// ============================================
// Component scores
// ============================================

/// Rank weight: top 10 count triple, next 10 double
#[inline]
pub fn position_weight(index: usize) -> f64 {
    match index {
        0..=9 => 3.0,
        10..=19 => 2.0,
        _ => 1.0,
    }
}

/// Step score for one hold duration (seconds)
pub fn hold_duration_score(duration: i64) -> f64 {
    if duration < SECS_PER_HOUR {
        100.0
    } else if duration < SECS_PER_DAY {
        80.0
    } else if duration < 7 * SECS_PER_DAY {
        50.0
    } else if duration < 30 * SECS_PER_DAY {
        30.0
    } else {
        10.0
    }
}

/// Position-weighted mean of the hold duration scores, 0 without holders
pub fn hold_time_score(holders: &[Holder]) -> f64 {
    let (weighted, total_weight) = holders.iter().enumerate().fold(
        (0.0, 0.0),
        |(weighted, total), (index, holder)| {
            let weight = position_weight(index);
            (
                weighted + hold_duration_score(holder.hold_duration) * weight,
                total + weight,
            )
        },
    );

    if total_weight == 0.0 {
        0.0
    } else {
        weighted / total_weight
    }
}

/// Supply share of the first `n` holders
pub fn top_supply(holders: &[Holder], n: usize) -> f64 {
    holders.iter().take(n).map(|h| h.supply_percentage).sum()
}

/// 50% of supply in the top 30 maxes the score
pub fn concentration_score(holders: &[Holder]) -> f64 {
    (top_supply(holders, CONCENTRATION_TOP_N) * 2.0).min(100.0)
}

pub fn wallet_connection_score(bundles: &[Bundle]) -> f64 {
    let same_block = bundles
        .iter()
        .filter(|b| b.bundle_type == BundleType::SameBlockBuy)
        .count() as f64
        * 20.0;
    let same_funder: f64 = bundles
        .iter()
        .filter(|b| b.bundle_type == BundleType::SameFunder)
        .map(|b| same_funder_score(b.size()) as f64)
        .sum();
    let controlled_supply = bundles
        .iter()
        .filter(|b| b.total_supply_percentage > 10.0)
        .count() as f64
        * 20.0;

    (same_block + same_funder + controlled_supply).min(100.0)
}

pub fn age_penalty(token_age: i64) -> f64 {
    if token_age < SECS_PER_HOUR {
        25.0
    } else if token_age < 2 * SECS_PER_HOUR {
        20.0
    } else if token_age < 4 * SECS_PER_HOUR {
        12.0
    } else if token_age < 8 * SECS_PER_HOUR {
        6.0
    } else {
        0.0
    }
}

pub fn maturity_bonus(token_age: i64, market_cap: f64) -> f64 {
    if token_age <= MATURITY_AGE_SECS {
        0.0
    } else if market_cap > 1_000_000.0 {
        -15.0
    } else if market_cap > 500_000.0 {
        -10.0
    } else {
        -5.0
    }
}

/// Raw sell bonus before the cap
fn raw_sell_bonus(holders: &[Holder]) -> (f64, usize) {
    let mut bonus = 0.0;
    let mut heavy = 0;

    for (index, holder) in holders.iter().enumerate() {
        if holder.sold_percentage >= SELLER_THRESHOLD_PCT {
            bonus += 6.0 * position_weight(index);
            heavy += 1;
        } else if holder.sold_percentage >= 25.0 {
            bonus += 4.0 * position_weight(index);
        }
    }

    let sold_ratio: f64 = holders
        .iter()
        .filter(|h| h.total_bought > 0.0)
        .map(|h| h.total_sold / h.total_bought)
        .sum();
    if sold_ratio > 0.1 {
        bonus += (sold_ratio * 50.0).min(15.0);
    }

    (bonus, heavy)
}

/// Sell behaviour bonus, capped at 25
pub fn sell_bonus(holders: &[Holder]) -> f64 {
    raw_sell_bonus(holders).0.min(SELL_BONUS_CAP)
}

// ============================================
// Calculator
// ============================================

#[derive(Debug, Clone, Copy, Default)]
pub struct CoalScoreCalculator;

impl CoalScoreCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate(&self, input: ScoreInput) -> TokenScanResult {
        if input.market_cap < LOW_MARKET_CAP_USD {
            return Self::low_market_cap_result(input);
        }

        let ScoreInput {
            contract_address,
            scan_timestamp,
            holders,
            bundles,
            market_cap,
            token_age,
            lp_safety,
            dev_reputation,
            metadata,
        } = input;

        let weight_bucket = WeightBucket::for_age(token_age);
        let weights = weight_bucket.profile();

        let hold = hold_time_score(&holders);
        let concentration = concentration_score(&holders);
        let connection = wallet_connection_score(&bundles);
        let base_score = hold * weights.hold_time
            + concentration * weights.concentration
            + connection * weights.connection;

        // Re-derive the holder-based LP fields before anything reads them
        let top10 = top_supply(&holders, 10);
        let mut lp_safety = lp_safety.unwrap_or_default();
        lp_safety.top_holders_risk = top10 > TOP10_RISK_THRESHOLD;
        lp_safety.dev_linkage = holders.iter().any(|h| h.has_label(WalletLabel::Named));
        let dev_reputation = dev_reputation.unwrap_or_else(DevReputation::unknown);

        let mut ledger = RuleLedger::default();

        let dev_penalty = Self::dev_penalty(&mut ledger, &dev_reputation);
        let lp_penalty = Self::lp_penalty(&mut ledger, &lp_safety, &weights);
        let red_flag_bonus = Self::red_flag_bonus(&mut ledger, &holders, top10);

        let weighted_connection = connection * weights.connection;
        if weighted_connection > 0.0 {
            ledger.add(
                RedFlagType::Bundle,
                weighted_connection,
                bundle_description(&bundles, connection, weighted_connection),
            );
        }

        let (raw_sell, heavy_sellers) = raw_sell_bonus(&holders);
        let sell = ledger.add(
            RedFlagType::Sell,
            raw_sell.min(SELL_BONUS_CAP),
            format!(
                "{} heavy sellers and recent selling pressure (+{})",
                heavy_sellers,
                fmt_points(raw_sell.min(SELL_BONUS_CAP))
            ),
        );

        let age = age_penalty(token_age);
        ledger.add(
            RedFlagType::Age,
            age,
            format!(
                "Token is only {} old (+{})",
                human_age(token_age),
                fmt_points(age)
            ),
        );

        let maturity = maturity_bonus(token_age, market_cap);

        let total = base_score + red_flag_bonus + sell + age + maturity + lp_penalty + dev_penalty;
        let coal_score = total.round().clamp(0.0, 100.0) as u8;
        let risk_level = RiskLevel::from_score(coal_score);

        debug!(
            "🧮 {} base={:.1} flags={:.1} sell={:.1} age={} maturity={} lp={:.1} dev={} => {}",
            contract_address,
            base_score,
            red_flag_bonus,
            sell,
            age,
            maturity,
            lp_penalty,
            dev_penalty,
            coal_score
        );

        TokenScanResult {
            contract_address,
            scan_timestamp,
            coal_score,
            risk_level,
            market_cap,
            token_age,
            score_breakdown: ScoreBreakdown {
                hold_time_score: hold,
                concentration_score: concentration,
                wallet_connection_score: connection,
                base_score,
                red_flag_bonus,
                sell_bonus: sell,
                age_penalty: age,
                maturity_bonus: maturity,
                lp_penalty,
                dev_penalty,
                weight_bucket,
                weights,
            },
            holders,
            bundles,
            red_flags: ledger.flags,
            lp_safety,
            dev_reputation,
            metadata,
        }
    }

    fn dev_penalty(ledger: &mut RuleLedger, dev: &DevReputation) -> f64 {
        if dev.is_serial_rugger {
            ledger.add(
                RedFlagType::SerialRugger,
                50.0,
                format!(
                    "Developer has a history of multiple rugs ({}/{}) (+50)",
                    dev.rug_count, dev.total_launched
                ),
            )
        } else if dev.reputation_score < 40.0 {
            ledger.add(
                RedFlagType::BadDevHistory,
                25.0,
                format!(
                    "Developer has a poor track record, reputation {:.0}% (+25)",
                    dev.reputation_score
                ),
            )
        } else if dev.reputation_score > 80.0 && dev.total_launched > 3 {
            -10.0
        } else {
            0.0
        }
    }

    fn lp_penalty(ledger: &mut RuleLedger, lp: &LpSafety, weights: &WeightProfile) -> f64 {
        let m = weights.safety_multiplier;
        let mut penalty = 0.0;

        if !lp.is_burned {
            let points = 20.0 * m;
            penalty += ledger.add(
                RedFlagType::LpNotBurned,
                points,
                format!("Liquidity pool tokens are not burned, high rug risk (+{})", fmt_points(points)),
            );
        }
        if !lp.mint_authority_disabled {
            let points = 15.0 * m;
            penalty += ledger.add(
                RedFlagType::MintEnabled,
                points,
                format!("Mint authority is still enabled, supply can be inflated (+{})", fmt_points(points)),
            );
        }
        if !lp.freeze_authority_disabled {
            let points = 10.0 * m;
            penalty += ledger.add(
                RedFlagType::FreezeEnabled,
                points,
                format!("Freeze authority is enabled, wallets can be frozen (+{})", fmt_points(points)),
            );
        }
        if lp.dev_linkage {
            let points = 15.0 * m;
            penalty += ledger.add(
                RedFlagType::DevLinkage,
                points,
                format!("Top holders are linked to the developer wallet (+{})", fmt_points(points)),
            );
        }
        if lp.wash_trading_score > 20.0 {
            let points = lp.wash_trading_score / 2.0 * m;
            penalty += ledger.add(
                RedFlagType::WashTrading,
                points,
                format!(
                    "High wash trading activity, score {:.0} (+{})",
                    lp.wash_trading_score,
                    fmt_points(points)
                ),
            );
        }

        penalty
    }

    fn red_flag_bonus(ledger: &mut RuleLedger, holders: &[Holder], top10: f64) -> f64 {
        let mut bonus = 0.0;

        if top10 > TOP10_RISK_THRESHOLD {
            let raw = ((top10 - TOP10_RISK_THRESHOLD) / 2.0).min(15.0);
            bonus += ledger.add_capped(
                RedFlagType::Concentration,
                raw,
                bonus,
                RED_FLAG_BONUS_CAP,
                format!("Top 10 holders own {:.1}% of supply", top10),
            );
        }

        let large_fresh = holders
            .iter()
            .filter(|h| h.supply_percentage > LARGE_HOLDER_PCT && h.hold_duration < LARGE_FRESH_HOLD_SECS)
            .count();
        if large_fresh >= 2 {
            let raw = (large_fresh as f64 * 6.0).min(12.0);
            bonus += ledger.add_capped(
                RedFlagType::LargeFreshHolders,
                raw,
                bonus,
                RED_FLAG_BONUS_CAP,
                format!("{} holders with >5% supply held for less than 2 days", large_fresh),
            );
        }

        bonus
    }

    /// Fixed EXTREME result for tokens under the market cap floor
    fn low_market_cap_result(input: ScoreInput) -> TokenScanResult {
        TokenScanResult {
            contract_address: input.contract_address,
            scan_timestamp: input.scan_timestamp,
            coal_score: LOW_MARKET_CAP_SCORE,
            risk_level: RiskLevel::Extreme,
            market_cap: input.market_cap,
            token_age: input.token_age,
            score_breakdown: ScoreBreakdown {
                weight_bucket: WeightBucket::for_age(input.token_age),
                weights: WeightBucket::for_age(input.token_age).profile(),
                ..ScoreBreakdown::default()
            },
            holders: input.holders,
            bundles: input.bundles,
            red_flags: vec![RedFlag::new(
                RedFlagType::LowMarketCap,
                format!(
                    "Market cap below ${:.0}k, extremely high risk",
                    LOW_MARKET_CAP_USD / 1_000.0
                ),
                LOW_MARKET_CAP_SCORE as f64,
            )],
            lp_safety: input.lp_safety.unwrap_or_else(LpSafety::unsafe_default),
            dev_reputation: input
                .dev_reputation
                .unwrap_or_else(DevReputation::unknown_rugger),
            metadata: input.metadata,
        }
    }
}

fn bundle_description(bundles: &[Bundle], connection: f64, weighted: f64) -> String {
    let count = |kind: BundleType| bundles.iter().filter(|b| b.bundle_type == kind).count();
    format!(
        "{} same-block, {} same-funder and {} coordinated-sell bundles (connection score {}, +{})",
        count(BundleType::SameBlockBuy),
        count(BundleType::SameFunder),
        count(BundleType::CoordinatedSell),
        fmt_points(connection),
        fmt_points(weighted)
    )
}

fn human_age(token_age: i64) -> String {
    if token_age < SECS_PER_HOUR {
        format!("{}m", token_age.max(0) / 60)
    } else {
        format!("{}h", token_age / SECS_PER_HOUR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const NOW_MS: i64 = 1_700_000_000_000;
    const TEN_DAYS: i64 = 10 * SECS_PER_DAY;

    fn holder(wallet: &str, supply_pct: f64, hold_duration: i64) -> Holder {
        let mut h = Holder::degraded(wallet, supply_pct, NOW_MS / 1_000);
        h.supply_percentage = supply_pct;
        h.hold_duration = hold_duration;
        h.labels.clear();
        h
    }

    fn safe_lp() -> LpSafety {
        LpSafety::default()
    }

    fn neutral_dev() -> DevReputation {
        DevReputation::from_history("dev", 0, 0)
    }

    fn input(holders: Vec<Holder>, bundles: Vec<Bundle>, market_cap: f64, token_age: i64) -> ScoreInput {
        ScoreInput {
            contract_address: "So11111111111111111111111111111111111111112".to_string(),
            scan_timestamp: NOW_MS,
            holders,
            bundles,
            market_cap,
            token_age,
            lp_safety: Some(safe_lp()),
            dev_reputation: Some(neutral_dev()),
            metadata: None,
        }
    }

    fn bundle(kind: BundleType, size: usize, supply: f64) -> Bundle {
        Bundle {
            bundle_id: format!("{}-{}", kind.as_str(), size),
            bundle_type: kind,
            wallet_addresses: (0..size).map(|i| format!("w{}", i)).collect(),
            total_supply_percentage: supply,
            detection_score: 20,
            block_height: None,
            funder_address: None,
            detection_time: NOW_MS,
        }
    }

    #[test]
    fn test_low_market_cap_override() {
        let mut data = input(vec![holder("a", 50.0, 10)], vec![], 14_999.0, 10);
        data.lp_safety = None;
        data.dev_reputation = None;

        let result = CoalScoreCalculator::new().calculate(data);
        assert_eq!(result.coal_score, 90);
        assert_eq!(result.risk_level, RiskLevel::Extreme);
        assert_eq!(result.red_flags.len(), 1);
        assert_eq!(result.red_flags[0].flag_type, RedFlagType::LowMarketCap);
        assert_eq!(result.red_flags[0].score, 90.0);
        assert_eq!(result.score_breakdown.base_score, 0.0);
        assert_eq!(result.lp_safety, LpSafety::unsafe_default());
        assert!(result.dev_reputation.is_serial_rugger);
        assert_eq!(result.holders.len(), 1);
    }

    #[test]
    fn test_low_market_cap_echoes_supplied_records() {
        let result = CoalScoreCalculator::new().calculate(input(vec![], vec![], 0.0, 10));
        assert_eq!(result.lp_safety, safe_lp());
        assert_eq!(result.dev_reputation, neutral_dev());
    }

    #[test]
    fn test_single_whale_arithmetic() {
        // One holder with all supply, held 40 days; token 100 000 s old, $50k cap
        let data = input(vec![holder("whale", 100.0, 40 * SECS_PER_DAY)], vec![], 50_000.0, 100_000);
        let result = CoalScoreCalculator::new().calculate(data);
        let b = &result.score_breakdown;

        assert_eq!(b.weight_bucket, WeightBucket::Mature);
        assert_eq!(b.hold_time_score, 10.0);
        assert_eq!(b.concentration_score, 100.0);
        assert_eq!(b.wallet_connection_score, 0.0);
        assert!((b.base_score - 35.0).abs() < 1e-9);
        assert_eq!(b.age_penalty, 0.0);
        assert_eq!(b.maturity_bonus, 0.0);
        assert_eq!(b.lp_penalty, 0.0);
        assert_eq!(b.dev_penalty, 0.0);

        // Top 10 hold 100% > 40%: concentration bonus min(15, 30) = 15
        assert_eq!(b.red_flag_bonus, 15.0);
        assert_eq!(result.coal_score, 50);
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert_eq!(result.red_flags.len(), 1);
        assert_eq!(result.red_flags[0].flag_type, RedFlagType::Concentration);
        assert_eq!(result.red_flags[0].score, 15.0);
        assert!(result.lp_safety.top_holders_risk);
    }

    #[test]
    fn test_weight_bucket_boundary() {
        let calc = CoalScoreCalculator::new();
        let newborn = calc.calculate(input(vec![], vec![], 50_000.0, 3_599));
        assert_eq!(newborn.score_breakdown.weight_bucket, WeightBucket::Newborn);
        assert_eq!(newborn.score_breakdown.weights, WeightProfile::NEWBORN);
        assert_eq!(newborn.score_breakdown.age_penalty, 25.0);

        let early = calc.calculate(input(vec![], vec![], 50_000.0, 3_600));
        assert_eq!(early.score_breakdown.weight_bucket, WeightBucket::Early);
        assert_eq!(early.score_breakdown.weights, WeightProfile::EARLY);
        assert_eq!(early.score_breakdown.age_penalty, 20.0);
    }

    #[test]
    fn test_safety_multiplier_in_flags() {
        let mut data = input(vec![], vec![], 50_000.0, 600);
        data.lp_safety = Some(LpSafety {
            is_burned: false,
            mint_authority_disabled: false,
            freeze_authority_disabled: true,
            lp_burn_percentage: 0.0,
            top_holders_risk: false,
            dev_linkage: false,
            wash_trading_score: 40.0,
        });
        let result = CoalScoreCalculator::new().calculate(data);

        // NEWBORN multiplier 1.5: (20 + 15 + 20) * 1.5
        assert_eq!(result.score_breakdown.lp_penalty, 82.5);
        let lp_flags: f64 = result
            .red_flags
            .iter()
            .filter(|f| {
                matches!(
                    f.flag_type,
                    RedFlagType::LpNotBurned | RedFlagType::MintEnabled | RedFlagType::WashTrading
                )
            })
            .map(|f| f.score)
            .sum();
        assert_eq!(lp_flags, 82.5);
        assert_eq!(result.coal_score, 100);
    }

    #[test]
    fn test_dev_linkage_recomputed_from_holders() {
        let mut named = holder("insider", 1.0, TEN_DAYS);
        named.labels.push(WalletLabel::Named);
        let mut data = input(vec![named], vec![], 50_000.0, TEN_DAYS);
        data.lp_safety = Some(LpSafety {
            dev_linkage: false,
            ..safe_lp()
        });

        let result = CoalScoreCalculator::new().calculate(data);
        assert!(result.lp_safety.dev_linkage);
        assert_eq!(result.score_breakdown.lp_penalty, 15.0);
        assert!(result
            .red_flags
            .iter()
            .any(|f| f.flag_type == RedFlagType::DevLinkage && f.score == 15.0));
    }

    #[test]
    fn test_dev_penalties() {
        let calc = CoalScoreCalculator::new();

        let mut data = input(vec![], vec![], 50_000.0, TEN_DAYS);
        data.dev_reputation = Some(DevReputation::from_history("dev", 5, 4));
        let rugger = calc.calculate(data);
        assert_eq!(rugger.score_breakdown.dev_penalty, 50.0);
        assert_eq!(rugger.red_flags[0].flag_type, RedFlagType::SerialRugger);

        let mut data = input(vec![], vec![], 50_000.0, TEN_DAYS);
        data.dev_reputation = Some(DevReputation::from_history("dev", 3, 2));
        let bad = calc.calculate(data);
        assert_eq!(bad.score_breakdown.dev_penalty, 25.0);
        assert_eq!(bad.red_flags[0].flag_type, RedFlagType::BadDevHistory);

        let mut data = input(vec![], vec![], 50_000.0, TEN_DAYS);
        data.dev_reputation = Some(DevReputation::from_history("dev", 10, 1));
        let proven = calc.calculate(data);
        assert_eq!(proven.score_breakdown.dev_penalty, -10.0);
        assert!(proven.red_flags.is_empty());
    }

    #[test]
    fn test_connection_score_capped() {
        let bundles: Vec<Bundle> = (0..4)
            .map(|_| bundle(BundleType::SameBlockBuy, 3, 12.0))
            .chain((0..2).map(|_| bundle(BundleType::SameFunder, 6, 20.0)))
            .collect();
        assert_eq!(wallet_connection_score(&bundles), 100.0);

        let result = CoalScoreCalculator::new().calculate(input(vec![], bundles, 50_000.0, TEN_DAYS));
        assert_eq!(result.score_breakdown.wallet_connection_score, 100.0);
        let flag = result
            .red_flags
            .iter()
            .find(|f| f.flag_type == RedFlagType::Bundle)
            .unwrap();
        // Flag carries only what the weighted connection term added
        assert_eq!(flag.score, 100.0 * WeightProfile::MATURE.connection);
        assert_eq!(flag.score, 20.0);
    }

    #[test]
    fn test_connection_score_components() {
        let bundles = vec![
            bundle(BundleType::SameBlockBuy, 3, 5.0),
            bundle(BundleType::SameFunder, 3, 11.0),
            bundle(BundleType::CoordinatedSell, 2, 1.0),
        ];
        // 20 + 15 + 20 (one bundle controls >10%)
        assert_eq!(wallet_connection_score(&bundles), 55.0);
    }

    #[test]
    fn test_sell_bonus_monotonic() {
        let mut previous = 0.0;
        for sold in (0..=100).step_by(5) {
            let mut h = holder("seller", 1.0, TEN_DAYS);
            h.total_bought = 100.0;
            h.total_sold = sold as f64;
            h.sold_percentage = sold as f64;
            let others = vec![holder("x", 1.0, TEN_DAYS), holder("y", 1.0, TEN_DAYS)];
            let mut holders = vec![h];
            holders.extend(others);

            let bonus = sell_bonus(&holders);
            assert!(bonus >= previous, "sell bonus dropped at {}%: {} < {}", sold, bonus, previous);
            assert!(bonus <= SELL_BONUS_CAP);
            previous = bonus;
        }
        assert!(previous > 0.0);
    }

    #[test]
    fn test_sell_flag_matches_bonus() {
        let mut holders: Vec<Holder> = (0..3).map(|i| holder(&format!("s{}", i), 1.0, TEN_DAYS)).collect();
        for h in holders.iter_mut() {
            h.total_bought = 100.0;
            h.total_sold = 60.0;
            h.sold_percentage = 60.0;
        }
        let result = CoalScoreCalculator::new().calculate(input(holders, vec![], 50_000.0, TEN_DAYS));
        let flag = result
            .red_flags
            .iter()
            .find(|f| f.flag_type == RedFlagType::Sell)
            .unwrap();
        // 3 * 18 capped at 25
        assert_eq!(result.score_breakdown.sell_bonus, 25.0);
        assert_eq!(flag.score, 25.0);
    }

    #[test]
    fn test_zero_bought_holders_ignored_in_ratio() {
        let mut h = holder("ghost", 1.0, TEN_DAYS);
        h.total_bought = 0.0;
        h.total_sold = 50.0;
        assert_eq!(sell_bonus(&[h]), 0.0);
    }

    #[test]
    fn test_large_fresh_holders_and_cap() {
        // Top 10 own 80%: concentration min(15, 20) = 15, plus 4 large fresh holders
        let holders: Vec<Holder> = (0..4).map(|i| holder(&format!("f{}", i), 20.0, 3_600)).collect();
        let result = CoalScoreCalculator::new().calculate(input(holders, vec![], 50_000.0, TEN_DAYS));

        assert_eq!(result.score_breakdown.red_flag_bonus, 25.0);
        let flag_total: f64 = result
            .red_flags
            .iter()
            .filter(|f| matches!(f.flag_type, RedFlagType::Concentration | RedFlagType::LargeFreshHolders))
            .map(|f| f.score)
            .sum();
        assert_eq!(flag_total, 25.0);
    }

    #[test]
    fn test_maturity_bonus() {
        assert_eq!(maturity_bonus(31 * SECS_PER_DAY, 2_000_000.0), -15.0);
        assert_eq!(maturity_bonus(31 * SECS_PER_DAY, 600_000.0), -10.0);
        assert_eq!(maturity_bonus(31 * SECS_PER_DAY, 20_000.0), -5.0);
        assert_eq!(maturity_bonus(30 * SECS_PER_DAY, 2_000_000.0), 0.0);
    }

    #[test]
    fn test_hold_time_score_weighting() {
        assert_eq!(hold_time_score(&[]), 0.0);

        // 10 fresh holders (weight 3, score 100) and 10 old holders (weight 2, score 10)
        let holders: Vec<Holder> = (0..20)
            .map(|i| {
                let duration = if i < 10 { 60 } else { 40 * SECS_PER_DAY };
                holder(&format!("h{}", i), 1.0, duration)
            })
            .collect();
        let expected = (10.0 * 3.0 * 100.0 + 10.0 * 2.0 * 10.0) / 50.0;
        assert!((hold_time_score(&holders) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_score_range_and_determinism() {
        let mut rng = StdRng::seed_from_u64(7);
        let calc = CoalScoreCalculator::new();

        for _ in 0..300 {
            let count = rng.gen_range(0..40);
            let holders: Vec<Holder> = (0..count)
                .map(|i| {
                    let mut h = holder(&format!("h{}", i), rng.gen_range(0.0..30.0), rng.gen_range(0..90 * SECS_PER_DAY));
                    h.total_bought = rng.gen_range(0.0..1_000.0);
                    h.total_sold = rng.gen_range(0.0..1_000.0);
                    h.sold_percentage = rng.gen_range(0.0..120.0);
                    if rng.gen_bool(0.1) {
                        h.labels.push(WalletLabel::Named);
                    }
                    h
                })
                .collect();
            let bundles: Vec<Bundle> = (0..rng.gen_range(0..6))
                .map(|i| {
                    let kind = match i % 3 {
                        0 => BundleType::SameBlockBuy,
                        1 => BundleType::SameFunder,
                        _ => BundleType::CoordinatedSell,
                    };
                    bundle(kind, rng.gen_range(2..8), rng.gen_range(0.0..40.0))
                })
                .collect();

            let mut data = input(holders, bundles, rng.gen_range(0.0..5_000_000.0), rng.gen_range(0..90 * SECS_PER_DAY));
            data.lp_safety = Some(LpSafety {
                is_burned: rng.gen_bool(0.5),
                mint_authority_disabled: rng.gen_bool(0.5),
                freeze_authority_disabled: rng.gen_bool(0.5),
                lp_burn_percentage: 0.0,
                top_holders_risk: false,
                dev_linkage: false,
                wash_trading_score: rng.gen_range(0.0..100.0),
            });
            data.dev_reputation = Some(DevReputation::from_history(
                "dev",
                rng.gen_range(0..10),
                rng.gen_range(0..10),
            ));

            let first = calc.calculate(data.clone());
            let second = calc.calculate(data);
            assert!(first.coal_score <= 100);
            assert_eq!(first.risk_level, RiskLevel::from_score(first.coal_score));
            assert!(first.score_breakdown.wallet_connection_score <= 100.0);
            assert!(first.score_breakdown.sell_bonus <= SELL_BONUS_CAP);
            assert!(first.score_breakdown.red_flag_bonus <= RED_FLAG_BONUS_CAP);
            assert_eq!(first, second);
        }
    }
}
