//! Background reaper for stuck claims and expired deposits.
//!
//! A request that dies mid-reconciliation leaves its claim behind; the
//! reaper returns such deposits to the claimable pool so the next webhook
//! or poll can finish the job. It also cancels deposits that sat unpaid
//! past the expiry window. The reaper never decides payment outcomes -
//! releasing a claim touches the lock fields only, never the status.

use std::sync::Arc;
use std::time::Duration;

use dataplug_store::{RocksStore, Store};

/// Reaper sweep configuration.
#[derive(Debug, Clone)]
pub struct ReaperConfig {
    /// How often to sweep.
    pub interval: Duration,

    /// Age past which a held claim counts as abandoned.
    pub claim_stale_after: chrono::Duration,

    /// Age past which an unpaid Pending deposit is cancelled.
    pub pending_expiry: chrono::Duration,
}

/// Spawn the background sweep task.
pub fn spawn(store: Arc<RocksStore>, config: ReaperConfig) -> tokio::task::JoinHandle<()> {
    tracing::info!(
        interval_seconds = config.interval.as_secs(),
        "Starting reconciliation reaper"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.interval);
        // The first tick fires immediately; skip it so startup is not
        // sweeping a database it just opened.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            sweep(&store, &config);
        }
    })
}

/// Run one sweep over both maintenance ops.
pub fn sweep(store: &RocksStore, config: &ReaperConfig) {
    match store.release_stale_claims(config.claim_stale_after) {
        Ok(0) => {}
        Ok(released) => {
            tracing::info!(released = released, "Released stale reconciliation claims");
        }
        Err(e) => tracing::error!(error = %e, "Stale claim sweep failed"),
    }

    match store.cancel_stale_pending(config.pending_expiry) {
        Ok(0) => {}
        Ok(cancelled) => {
            tracing::info!(cancelled = cancelled, "Cancelled expired unpaid deposits");
        }
        Err(e) => tracing::error!(error = %e, "Expiry sweep failed"),
    }
}
