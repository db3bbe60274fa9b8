//! Constants Module - Single Source of Truth
//!
//! Every tunable threshold, default and endpoint used across the scanner is
//! defined here. No hardcoded values in other modules.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "CoalScan";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for outbound HTTP requests
pub const USER_AGENT: &str = concat!("CoalScan/", env!("CARGO_PKG_VERSION"));

// ============================================
// UPSTREAM DEFAULTS
// ============================================

/// Public Solana mainnet RPC
pub const DEFAULT_SOLANA_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// DexScreener token endpoint (address appended)
pub const DEFAULT_PRICE_API_URL: &str = "https://api.dexscreener.com/latest/dex/tokens";

/// Default timeout for RPC requests (seconds)
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;

/// Retry attempts per gateway call (including the first)
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;

/// First backoff delay, doubled per attempt
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 250;

/// Backoff ceiling
pub const MAX_RETRY_DELAY_MS: u64 = 5_000;

/// Lifetime of a remembered `{mint}:{owner}` token account (seconds)
pub const TOKEN_ACCOUNT_TTL_SECS: u64 = 600;

/// Remembered token accounts before expired entries are swept
pub const TOKEN_ACCOUNT_MEMO_CAPACITY: usize = 5_000;

/// Backoff jitter factor (±20%)
pub const RETRY_JITTER_FACTOR: f64 = 0.2;

// ============================================
// SCAN PIPELINE
// ============================================

/// Holders enriched per scan
pub const DEFAULT_HOLDER_LIMIT: usize = 20;

/// Upper clamp for HOLDER_LIMIT
pub const MAX_HOLDER_LIMIT: usize = 50;

/// Transactions fetched per holder
pub const DEFAULT_TX_HISTORY_LIMIT: usize = 10;

/// Concurrent holder enrichments
pub const DEFAULT_ENRICH_CONCURRENCY: usize = 5;

/// Result cache TTL (seconds)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 120;

/// Cache key prefix, full key is `scan:{address}`
pub const CACHE_KEY_PREFIX: &str = "scan:";

/// Valid address length range (base58)
pub const MIN_ADDRESS_LEN: usize = 32;
pub const MAX_ADDRESS_LEN: usize = 44;

// ============================================
// HOLDER ENRICHMENT
// ============================================

/// Hold-time fallback when a wallet's history is unavailable (1 day)
pub const FALLBACK_HOLD_SECS: i64 = 86_400;

/// Coarse P/L factor applied to (sold - bought)
pub const PROFIT_LOSS_FACTOR: f64 = 0.5;

/// FRESH when fewer transactions than this
pub const FRESH_TX_THRESHOLD: u32 = 50;

/// BOT when this many transactions land inside BOT_WINDOW_SECS
pub const BOT_TX_THRESHOLD: usize = 100;
pub const BOT_WINDOW_SECS: i64 = 60;

/// DORMANT after this long without activity (7 days)
pub const DORMANT_SECS: i64 = 7 * 86_400;

// ============================================
// BUNDLE DETECTION
// ============================================

pub const MIN_SAME_BLOCK_BUNDLE: usize = 3;
pub const MIN_SAME_FUNDER_BUNDLE: usize = 3;
pub const MIN_COORDINATED_SELL_BUNDLE: usize = 2;

/// Funder prefix length used when no funder is resolved
pub const FUNDER_PREFIX_LEN: usize = 8;

/// Coordinated sell time window (seconds)
pub const SELL_WINDOW_SECS: i64 = 60;

/// Sold percentage marking a holder as a seller
pub const SELLER_THRESHOLD_PCT: f64 = 50.0;

// ============================================
// SCORING
// ============================================

/// Market cap below which the fixed EXTREME result is returned
pub const LOW_MARKET_CAP_USD: f64 = 15_000.0;

/// Score returned by the low market cap override
pub const LOW_MARKET_CAP_SCORE: u8 = 90;

/// Holders counted toward concentration
pub const CONCENTRATION_TOP_N: usize = 30;

/// Top-10 supply share above which concentration is a red flag
pub const TOP10_RISK_THRESHOLD: f64 = 40.0;

/// Cap on the red flag bonus
pub const RED_FLAG_BONUS_CAP: f64 = 25.0;

/// Cap on the sell bonus
pub const SELL_BONUS_CAP: f64 = 25.0;

/// A holder above this share counts as a large holder
pub const LARGE_HOLDER_PCT: f64 = 5.0;

/// Large holders younger than this are fresh (2 days)
pub const LARGE_FRESH_HOLD_SECS: i64 = 2 * 86_400;

/// Maturity bonus starts after this age (30 days)
pub const MATURITY_AGE_SECS: i64 = 30 * 86_400;

pub const SECS_PER_HOUR: i64 = 3_600;
pub const SECS_PER_DAY: i64 = 86_400;

// ============================================
// API
// ============================================

/// Default API port
pub const DEFAULT_API_PORT: u16 = 3001;

/// Default API host
pub const DEFAULT_API_HOST: &str = "0.0.0.0";

/// Requests per client per window
pub const DEFAULT_API_RATE_LIMIT: u32 = 100;

/// Rate limiter window (seconds)
pub const DEFAULT_API_RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Interval of the background memory-cache cleanup task (seconds)
pub const CACHE_CLEANUP_INTERVAL_SECS: u64 = 60;
