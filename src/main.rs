//! Coal Scan CLI - one-shot token risk scan
//!
//! Usage:
//!   coalscan <TOKEN_ADDRESS> [--force]
//!
//! Prints the scan result as pretty JSON on stdout; logs go to stderr.
//! Configuration comes from the same environment variables as the API.

use coal_scan::{ScanConfig, ScanService};

use eyre::{eyre, Result};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let mut address = None;
    let mut force_refresh = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--force" | "-f" => force_refresh = true,
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            _ if address.is_none() => address = Some(arg),
            other => return Err(eyre!("Unexpected argument: {}", other)),
        }
    }

    let Some(address) = address else {
        print_usage();
        return Err(eyre!("Missing token address"));
    };

    let service = ScanService::from_config(ScanConfig::from_env()).await?;
    let result = service.scan(&address, force_refresh).await?;

    eprintln!(
        "{} Coal Score {} ({}) for {}",
        result.risk_level.emoji(),
        result.coal_score,
        result.risk_level.as_str(),
        result.contract_address
    );
    for flag in &result.red_flags {
        eprintln!("   🚩 {}", flag.description);
    }
    eprintln!("{}", service.stats().summary());

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn print_usage() {
    eprintln!("Usage: coalscan <TOKEN_ADDRESS> [--force]");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SOLANA_RPC_URL   RPC endpoint (default: public mainnet)");
    eprintln!("  REDIS_URL        Optional Redis cache");
    eprintln!("  HOLDER_LIMIT     Holders to analyze (default: 20, max: 50)");
    eprintln!("  RUST_LOG         Log level (default: warn)");
}
