//! Application state.

use std::sync::Arc;
use std::time::Duration;

use dataplug_gateway::GatewayClient;
use dataplug_store::RocksStore;

use crate::config::ServiceConfig;
use crate::reconcile::Reconciler;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Paystack client for initiating and verifying charges (optional).
    pub gateway: Option<Arc<GatewayClient>>,

    /// Reconciliation engine (present when the gateway is configured).
    pub reconciler: Option<Arc<Reconciler>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        // Create Paystack client if configured
        let gateway = config.paystack_secret_key.as_ref().and_then(|key| {
            let timeout = Duration::from_secs(config.gateway_timeout_seconds);
            match GatewayClient::with_timeout(&config.paystack_base_url, key, timeout) {
                Ok(client) => {
                    tracing::info!(base_url = %config.paystack_base_url, "Paystack integration enabled");
                    Some(Arc::new(client))
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create Paystack client");
                    None
                }
            }
        });

        if gateway.is_none() {
            tracing::warn!("Paystack not configured - deposits cannot be initiated or verified");
        }

        // The engine only makes sense with a gateway to ask
        let reconciler = gateway.as_ref().map(|gw| {
            Arc::new(Reconciler::new(
                Arc::clone(&store),
                Arc::clone(gw),
                chrono::Duration::seconds(config.claim_stale_seconds),
            ))
        });

        Self {
            store,
            config,
            gateway,
            reconciler,
        }
    }

    /// Check if the payment gateway is configured.
    #[must_use]
    pub fn has_gateway(&self) -> bool {
        self.gateway.is_some()
    }
}
