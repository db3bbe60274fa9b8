//! Coal Scan Library
//!
//! Token risk scanner computing the Coal Score (0-100) from:
//! - Holder behaviour (hold time, selling, fresh/bot/dormant wallets)
//! - Supply concentration
//! - Coordinated wallet bundles (same block, same funder, coordinated sells)
//! - LP, mint and freeze authority state
//! - Deployer launch history

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{BundleDetector, CoalScoreCalculator, HolderEnricher, ScanService, ScoreInput};
pub use models::{AppError, AppResult, ErrorCode, RiskLevel, ScanConfig, TokenScanResult};
pub use providers::{SolanaGateway, TokenGateway};
pub use utils::{MemoryScanCache, RedisScanCache, ScanCache};
