//! Deposit Sentry insight host
//!
//! Usage:
//!   cargo run --bin deposit_sentry
//!
//! Environment:
//!   POLYGON_HTTP_URL           - Archive-capable Polygon JSON-RPC endpoint
//!   ALCHEMY_API_KEY            - Used when POLYGON_HTTP_URL is unset
//!   SENTRY_RPC_TIMEOUT_SECS    - Per-request RPC timeout (default: 10)
//!   SENTRY_EVAL_TIMEOUT_SECS   - Whole-evaluation deadline (default: 60)
//!   SENTRY_RPC_MAX_RETRIES     - Attempts for retryable RPC failures (default: 3)
//!   SENTRY_RECEIPTS_MODE       - block | per-tx | auto (default: auto)
//!   SENTRY_HOST / SENTRY_PORT  - Bind address (default: 0.0.0.0:8080)
//!   RUST_LOG                   - Log filter (default: info)

use deposit_sentry::api::{create_router, handlers::AppState, start_cleanup_task};
use deposit_sentry::utils::constants::{APP_NAME, APP_VERSION};
use deposit_sentry::{ChainClient, DepositGuard, GuardConfig, RpcProvider, TelemetryCollector};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    info!("🛡️ {} v{}", APP_NAME, APP_VERSION);

    let config = GuardConfig::from_env()?;
    let provider = RpcProvider::new(&config)?;
    info!("🔗 RPC endpoint: {}", provider.masked_url());
    info!(
        "⚙️ receipts mode {:?}, rpc timeout {:?}, evaluation deadline {:?}",
        config.receipts_mode, config.rpc_timeout, config.eval_timeout
    );

    let client: Arc<dyn ChainClient> = Arc::new(provider);
    let guard = Arc::new(DepositGuard::new(client, &config)?);
    let telemetry = Arc::new(TelemetryCollector::new());
    let state = Arc::new(AppState::new(guard, telemetry.clone()));

    start_cleanup_task();
    info!("🧹 Background cleanup task started");

    let app = create_router(state);

    let host = std::env::var("SENTRY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("SENTRY_PORT"))
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("🚀 Listening on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /v1/transaction/insight - Pre-signing deposit check");
    info!("  GET  /v1/stats               - Evaluation counters");
    info!("  GET  /v1/health              - Health check");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("⚠️ Failed to listen for Ctrl+C: {}", e);
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    let stats = telemetry.get_stats();
    info!("🛑 Shutdown complete");
    info!("   Evaluations: {}", stats.total_evaluations);
    info!(
        "   Safe / Caution / Critical: {} / {} / {}",
        stats.safe, stats.caution, stats.critical
    );
    info!("   Degraded: {}, Failed: {}", stats.degraded, stats.failed);

    Ok(())
}
