//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{deposits, health, wallet, webhooks};
use crate::state::AppState;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Deposits (storefront JWT auth)
/// - `POST /v1/deposits` - Initiate a deposit
/// - `GET /v1/deposits` - List deposit history
/// - `GET /v1/deposits/:reference` - Get one deposit
/// - `POST /v1/deposits/:reference/verify` - Verify/poll a deposit
///
/// ## Wallet (storefront JWT auth)
/// - `GET /v1/wallet` - Get wallet balance
/// - `GET /v1/wallet/ledger` - List ledger entries
///
/// ## Admin (`x-admin-key`)
/// - `POST /v1/admin/deposits/:reference/verify` - Force verification
///
/// ## Webhooks (signature verification)
/// - `POST /webhooks/paystack` - Paystack charge events
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // Create concurrency-limited API routes
    let api_routes = Router::new()
        // Deposits
        .route("/deposits", post(deposits::initiate_deposit))
        .route("/deposits", get(deposits::list_deposits))
        .route("/deposits/:reference", get(deposits::get_deposit))
        .route(
            "/deposits/:reference/verify",
            post(deposits::verify_deposit),
        )
        // Admin
        .route(
            "/admin/deposits/:reference/verify",
            post(deposits::admin_verify_deposit),
        )
        // Wallet
        .route("/wallet", get(wallet::get_wallet))
        .route("/wallet/ledger", get(wallet::list_ledger))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
        // Webhooks (no rate limit - delivery volume is controlled by Paystack)
        .route("/webhooks/paystack", post(webhooks::paystack_webhook))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
