//! `RocksDB` storage layer for DataPlug.
//!
//! This crate provides persistent storage for wallets and deposit
//! transactions using `RocksDB` with column families for efficient
//! indexing.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `wallets`: Wallet records with embedded ledgers, keyed by `user_id`
//! - `deposits`: Deposit transactions, keyed by deposit reference
//! - `deposits_by_user`: Index for listing deposits by user
//!
//! # Claim discipline
//!
//! Reconciliation runs concurrently (webhook delivery, client polling and
//! admin retries can all race), so every state change to a deposit goes
//! through the claim protocol: [`Store::claim_deposit`] grants at most one
//! live claim per reference, and [`Store::commit_credit`],
//! [`Store::mark_failed`] and [`Store::release_claim`] only accept the
//! idempotency key that holds the claim.
//!
//! # Example
//!
//! ```no_run
//! use dataplug_core::{DepositReference, DepositTransaction, UserId};
//! use dataplug_store::{ClaimOutcome, RocksStore, Store};
//!
//! let store = RocksStore::open("/tmp/dataplug-db").unwrap();
//!
//! let deposit = DepositTransaction::pending(
//!     DepositReference::generate(),
//!     UserId::generate(),
//!     5000,
//!     5100,
//! );
//! store.create_deposit(&deposit).unwrap();
//!
//! let outcome = store
//!     .claim_deposit(&deposit.reference, "wh-abc123", chrono::Duration::minutes(5))
//!     .unwrap();
//! assert!(matches!(outcome, ClaimOutcome::Claimed(_)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use chrono::{DateTime, Duration, Utc};
use dataplug_core::{DepositReference, DepositTransaction, UserId, Wallet};

/// Outcome of a claim attempt on a deposit.
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    /// The claim succeeded; the caller now owns reconciliation for this
    /// deposit until it commits, fails or releases.
    Claimed(DepositTransaction),

    /// Another attempt holds a live claim.
    Busy,

    /// The deposit is already in a terminal state. For completed deposits
    /// the record carries the balance snapshot taken at commit, so replays
    /// can answer without touching the wallet.
    Terminal(DepositTransaction),
}

/// Gateway facts recorded on a deposit when it is committed.
#[derive(Debug, Clone, Default)]
pub struct SettlementDetails {
    /// Gateway-side transaction ID.
    pub gateway_reference: Option<String>,

    /// Payment channel (card, mobile money, ...).
    pub channel: Option<String>,

    /// When the gateway reports the charge was paid.
    pub paid_at: Option<DateTime<Utc>>,
}

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // Wallet Operations
    // =========================================================================

    /// Insert or update a wallet record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_wallet(&self, wallet: &Wallet) -> Result<()>;

    /// Get a wallet by user ID.
    ///
    /// Wallets are created lazily by the first credit, so `None` is the
    /// normal answer for a user who has never deposited.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_wallet(&self, user_id: &UserId) -> Result<Option<Wallet>>;

    // =========================================================================
    // Deposit Operations
    // =========================================================================

    /// Insert a new deposit transaction.
    ///
    /// This also maintains the user index.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateReference` if a deposit with this
    /// reference already exists.
    fn create_deposit(&self, deposit: &DepositTransaction) -> Result<()>;

    /// Get a deposit by reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_deposit(&self, reference: &DepositReference) -> Result<Option<DepositTransaction>>;

    /// List deposits for a user, ordered by time (newest first).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_deposits_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DepositTransaction>>;

    // =========================================================================
    // Claim Operations
    // =========================================================================

    /// Attempt to claim a pending deposit for reconciliation.
    ///
    /// At most one live claim exists per reference. A claim succeeds when
    /// the deposit is pending and either unclaimed or held by a claim older
    /// than `stale_after`; the winning attempt's `idempotency_key` is
    /// stamped on the record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no deposit has this reference.
    fn claim_deposit(
        &self,
        reference: &DepositReference,
        idempotency_key: &str,
        stale_after: Duration,
    ) -> Result<ClaimOutcome>;

    /// Release a claim without changing the deposit status.
    ///
    /// Used when reconciliation cannot reach a verdict (gateway outage,
    /// charge still pending); the deposit stays `Pending` and becomes
    /// claimable again immediately. Releasing an unclaimed deposit is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if no deposit has this reference.
    /// - `StoreError::ClaimMismatch` if the claim is held by a different
    ///   idempotency key.
    fn release_claim(
        &self,
        reference: &DepositReference,
        idempotency_key: &str,
        error: Option<&str>,
    ) -> Result<()>;

    // =========================================================================
    // Settlement Operations
    // =========================================================================

    /// Complete a claimed deposit: credit the wallet and finalize the
    /// deposit record atomically.
    ///
    /// Creates the wallet if this is the user's first credit. The new
    /// balance is snapshotted onto the deposit so later replays answer
    /// from the record alone. Returns the completed deposit.
    ///
    /// Committing an already-completed deposit returns the stored record
    /// unchanged.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if no deposit has this reference.
    /// - `StoreError::NotClaimed` if the deposit has no live claim.
    /// - `StoreError::ClaimMismatch` if the claim is held by a different
    ///   idempotency key.
    fn commit_credit(
        &self,
        reference: &DepositReference,
        idempotency_key: &str,
        settlement: &SettlementDetails,
    ) -> Result<DepositTransaction>;

    /// Fail a claimed deposit.
    ///
    /// The wallet is not touched. Returns the failed deposit.
    ///
    /// # Errors
    ///
    /// Same contract as [`Store::commit_credit`].
    fn mark_failed(
        &self,
        reference: &DepositReference,
        idempotency_key: &str,
        reason: &str,
    ) -> Result<DepositTransaction>;

    // =========================================================================
    // Maintenance Sweeps
    // =========================================================================

    /// Release every claim older than `stale_after`.
    ///
    /// Statuses are never changed: a released deposit stays `Pending` and
    /// reconciliation can retry it. Returns the number of claims released.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn release_stale_claims(&self, stale_after: Duration) -> Result<usize>;

    /// Cancel unclaimed pending deposits older than `older_than`.
    ///
    /// This is the only producer of the `Cancelled` status. Deposits with
    /// a live claim are skipped. Returns the number of deposits cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn cancel_stale_pending(&self, older_than: Duration) -> Result<usize>;
}
