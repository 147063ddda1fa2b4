//! rankbot - XP to group rank bridge
//!
//! Game servers POST progression updates; the bridge resolves each player's
//! XP to a rank and updates their group role through the Roblox API.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rankbot::config::{
    normalize_base_url, BridgeConfig, DEFAULT_CLOUD_BASE_URL, DEFAULT_GROUPS_BASE_URL,
    DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use rankbot::remote::RobloxClient;
use rankbot::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use rankbot::{build_router, AppState, PromotionPipeline};
use rankbot_common::config::resolve_tier_table;
use rankbot_common::tiers::DEFAULT_MAX_MANAGED_RANK;
use rankbot_common::Rank;
use tokio::signal;
use tracing::{info, warn};

/// Command-line arguments for rankbot
#[derive(Parser, Debug)]
#[command(name = "rankbot")]
#[command(about = "Synchronizes group ranks from XP progression")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    port: u16,

    /// Group whose memberships are managed
    #[arg(long, default_value = "", env = "GROUP_ID")]
    group_id: String,

    /// Open Cloud API key used for membership updates
    #[arg(long, default_value = "", env = "ROBLOX_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Secret callers must include in each update
    #[arg(long, default_value = "", env = "SHARED_SECRET", hide_env_values = true)]
    shared_secret: String,

    /// Attempts per membership write, including the first
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS, env = "RETRY_MAX_ATTEMPTS")]
    max_attempts: u32,

    /// Backoff unit in milliseconds; attempt n waits n times this
    #[arg(long, default_value_t = 250, env = "RETRY_BASE_DELAY_MS")]
    retry_base_delay_ms: u64,

    /// Highest rank the bridge will assign
    #[arg(long, default_value_t = DEFAULT_MAX_MANAGED_RANK, env = "MAX_MANAGED_RANK")]
    max_managed_rank: Rank,

    /// TOML file replacing the built-in tier table
    #[arg(long, env = "TIERS_FILE")]
    tiers_file: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_GROUPS_BASE_URL, env = "ROBLOX_GROUPS_URL")]
    groups_base_url: String,

    #[arg(long, default_value = DEFAULT_CLOUD_BASE_URL, env = "ROBLOX_CLOUD_URL")]
    cloud_base_url: String,

    /// Timeout for each outbound request
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS, env = "ROBLOX_TIMEOUT_SECS")]
    request_timeout_secs: u64,
}

impl From<Args> for BridgeConfig {
    fn from(args: Args) -> Self {
        Self {
            port: args.port,
            group_id: args.group_id.trim().to_string(),
            api_key: args.api_key.trim().to_string(),
            shared_secret: args.shared_secret.trim().to_string(),
            retry: RetryPolicy::new(
                args.max_attempts,
                Duration::from_millis(args.retry_base_delay_ms),
            ),
            max_managed_rank: args.max_managed_rank,
            tiers_file: args.tiers_file,
            groups_base_url: normalize_base_url(&args.groups_base_url),
            cloud_base_url: normalize_base_url(&args.cloud_base_url),
            request_timeout: Duration::from_secs(args.request_timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .init();

    let config: BridgeConfig = Args::parse().into();

    info!("Starting rankbot v{}", env!("CARGO_PKG_VERSION"));

    // Missing credentials are not fatal; requests fail until they are set
    for name in config.missing_required() {
        warn!("[ENV] Missing {}", name);
    }

    let tiers = resolve_tier_table(config.tiers_file.as_deref(), config.max_managed_rank)
        .context("Failed to load tier table")?;
    info!(
        tiers = tiers.tiers().len(),
        max_managed_rank = tiers.max_managed_rank(),
        max_attempts = config.retry.max_attempts,
        base_delay_ms = config.retry.base_delay.as_millis() as u64,
        "Promotion settings"
    );

    let client = RobloxClient::new(&config).context("Failed to create Roblox client")?;
    let pipeline = Arc::new(PromotionPipeline::new(
        Arc::new(client),
        tiers,
        config.retry,
        config.shared_secret.clone(),
    ));

    let app = build_router(AppState::new(Arc::clone(&pipeline)));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Server running on port {}", config.port);

    // Preload in the background; the first request retries on failure
    tokio::spawn(async move {
        match pipeline.preload().await {
            Ok(count) => info!(roles = count, "Preloaded roles + owner OK"),
            Err(e) => warn!(error = %e, "Preload failed (will retry on first request)"),
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
