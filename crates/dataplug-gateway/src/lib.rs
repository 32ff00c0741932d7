//! Paystack payment gateway client for DataPlug.
//!
//! This crate wraps the two gateway calls the deposit pipeline needs:
//! initializing a hosted-checkout transaction and verifying a charge by
//! reference. Verification answers with a tagged tri-state outcome
//! ([`ChargeOutcome`]) so callers never have to interpret raw gateway
//! status strings, and transient transport trouble stays distinct from a
//! definitive gateway verdict.
//!
//! # Example
//!
//! ```no_run
//! use dataplug_gateway::{ChargeOutcome, GatewayClient, RetryPolicy};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GatewayClient::new("https://api.paystack.co", "sk_test_xxx")?;
//!
//! let charge = client
//!     .verify("DEP-a1b2c3d4-1700000000000", &RetryPolicy::default())
//!     .await?;
//!
//! match charge.outcome {
//!     ChargeOutcome::Success => println!("paid {} pesewas", charge.amount_pesewas),
//!     ChargeOutcome::Pending => println!("customer has not paid yet"),
//!     ChargeOutcome::Failed => println!("charge failed"),
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod retry;
mod types;

pub use client::GatewayClient;
pub use error::GatewayError;
pub use retry::RetryPolicy;
pub use types::{
    ChargeOutcome, InitializeRequest, InitializedCharge, VerifiedCharge, WebhookChargeData,
    WebhookEvent,
};
