//! Core types for the DataPlug deposit and wallet platform.
//!
//! This crate provides the domain types shared across the platform:
//!
//! - **Identifiers**: `UserId`, `DepositReference`
//! - **Deposits**: `DepositTransaction`, `DepositStatus`
//! - **Wallets**: `Wallet`, `LedgerEntry`, `LedgerEntryType`
//!
//! # Money
//!
//! **All amounts are integer pesewas** (100 pesewas = 1 GHS), matching the
//! minor units the payment gateway reports:
//!
//! - User deposits GHS 50.00 → `amount_pesewas = 5000`
//! - Gateway webhook reports `amount: 5000` → compares equal directly
//! - Stored as `i64` to keep floating point out of every money path

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod deposit;
pub mod fees;
pub mod ids;
pub mod reference;
pub mod wallet;

pub use deposit::{DepositStatus, DepositTransaction};
pub use fees::FeeSchedule;
pub use ids::{EntryId, IdError, UserId};
pub use reference::{DepositReference, ReferenceError, DEPOSIT_PREFIX};
pub use wallet::{LedgerEntry, LedgerEntryType, Wallet, WalletError};
