//! Providers Module - External Data Sources
//!
//! The `TokenGateway` contract and its Solana JSON-RPC implementation,
//! backed by the RPC client and DexScreener market data.

pub mod dexscreener;
pub mod gateway;
pub mod rpc;
pub mod solana;

pub use dexscreener::{DexScreenerClient, MarketSnapshot};
pub use gateway::TokenGateway;
pub use rpc::RpcClient;
pub use solana::SolanaGateway;
