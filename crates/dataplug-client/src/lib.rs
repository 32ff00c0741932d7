//! Dataplug Client SDK.
//!
//! This crate provides a client library for the storefront backend to
//! interact with the dataplug deposit API.
//!
//! # Example
//!
//! ```no_run
//! use dataplug_client::{DataplugClient, InitiateDepositRequest};
//!
//! # async fn example(user_jwt: &str) -> Result<(), dataplug_client::ClientError> {
//! let client = DataplugClient::new("http://dataplug.payments.svc:8080");
//!
//! // Start a deposit and send the customer to checkout
//! let deposit = client.initiate_deposit(user_jwt, &InitiateDepositRequest {
//!     amount_pesewas: 5000,
//!     email: "customer@example.com".to_string(),
//! }).await?;
//!
//! println!("Redirect to: {}", deposit.authorization_url);
//!
//! // Poll after the customer returns from checkout
//! let verdict = client.verify_deposit(user_jwt, &deposit.reference).await?;
//! if verdict.success {
//!     println!("Credited; balance is now {:?}", verdict.new_balance_pesewas);
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
mod types;

pub use client::{ClientOptions, DataplugClient};
pub use error::ClientError;
pub use types::*;
