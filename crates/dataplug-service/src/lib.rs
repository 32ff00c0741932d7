//! DataPlug HTTP API Service.
//!
//! This crate provides the HTTP API for the dataplug deposit subsystem,
//! including:
//!
//! - Deposit initiation via hosted checkout
//! - Deposit verification (webhook, customer poll, admin force)
//! - Wallet balance and ledger history
//! - Paystack webhooks
//!
//! # Authentication
//!
//! The service supports two authentication methods:
//!
//! 1. **Storefront JWT tokens** - For end-user requests
//! 2. **Admin API key** - For back-office force verification

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for consistency

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod reconcile;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use reconcile::{
    ReaperConfig, ReconcileError, ReconcileOutcome, Reconciler, Trigger, VerificationCache,
};
pub use routes::create_router;
pub use state::AppState;
