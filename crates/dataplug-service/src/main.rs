//! DataPlug Service - HTTP API for deposits and wallet credits
//!
//! This is the main entry point for the dataplug service.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dataplug_service::{create_router, reconcile, AppState, ReaperConfig, ServiceConfig};
use dataplug_store::RocksStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dataplug=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting DataPlug Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        paystack_configured = %config.paystack_secret_key.is_some(),
        admin_key_configured = %config.admin_api_key.is_some(),
        "Service configuration loaded"
    );

    // Initialize RocksDB store
    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    let store = Arc::new(RocksStore::open(&config.data_dir)?);

    // Start the stuck-claim reaper
    let reaper_config = ReaperConfig {
        interval: Duration::from_secs(config.reaper_interval_seconds),
        claim_stale_after: chrono::Duration::seconds(config.claim_stale_seconds),
        pending_expiry: chrono::Duration::hours(config.pending_expiry_hours),
    };
    let _reaper = reconcile::reaper::spawn(Arc::clone(&store), reaper_config);

    // Build app state
    let state = AppState::new(store, config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
