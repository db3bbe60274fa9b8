//! Coal Scan API Server
//!
//! REST API exposing the Coal Score token risk scanner
//!
//! Usage:
//!   cargo run --bin coalscan_api
//!
//! Environment:
//!   PORT / COAL_PORT - Server port (default: 3001)
//!   COAL_HOST        - Server host (default: 0.0.0.0)
//!   SOLANA_RPC_URL   - RPC endpoint
//!   REDIS_URL        - Optional Redis cache (memory cache otherwise)
//!   RUST_LOG         - Log level (default: info)

use coal_scan::api::{create_router, handlers::ENDPOINTS, AppState, RateLimitConfig};
use coal_scan::{ScanConfig, ScanService};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    print_banner();

    let config = ScanConfig::from_env();
    let addr: SocketAddr = config.bind_addr().parse()?;
    let rate_limit = RateLimitConfig::from(&config);

    let scanner = Arc::new(ScanService::from_config(config).await?);
    let scanner_for_shutdown = scanner.clone();

    // Create app state (spawns the cache cleanup task)
    let state = Arc::new(AppState::new(scanner, rate_limit));
    info!("🧹 Background cleanup task started");

    let app = create_router(state);

    info!("🚀 Coal Scan API starting on http://{}", addr);
    info!("📚 Health: http://{}/health", addr);
    info!("");
    info!("Endpoints:");
    for endpoint in ENDPOINTS {
        info!("  {}", endpoint);
    }
    info!("");
    info!("Press Ctrl+C for graceful shutdown");
    info!("");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("⚠️ Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("");
    info!("🛑 Shutdown signal received, cleaning up...");
    info!("{}", scanner_for_shutdown.stats().summary());
    info!("👋 Coal Scan API shutdown complete");

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ╔══════════════════════════════════════════════════════╗
    ║                                                      ║
    ║    ██████╗ ██████╗  █████╗ ██╗                       ║
    ║   ██╔════╝██╔═══██╗██╔══██╗██║                       ║
    ║   ██║     ██║   ██║███████║██║                       ║
    ║   ██║     ██║   ██║██╔══██║██║                       ║
    ║   ╚██████╗╚██████╔╝██║  ██║███████╗                  ║
    ║    ╚═════╝ ╚═════╝ ╚═╝  ╚═╝╚══════╝                  ║
    ║                  S C A N                             ║
    ║                                                      ║
    ║        Coal Score Token Risk Scanner API             ║
    ║                                                      ║
    ╚══════════════════════════════════════════════════════╝
    "#
    );
}
