//! Wallet and ledger entry types.
//!
//! Each user has at most one wallet, created lazily on first credit. The
//! wallet document embeds its full ledger: every balance change appends a
//! `LedgerEntry` carrying the balance before and after the change, so the
//! ledger forms a verifiable chain from zero to the current balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EntryId, UserId};

/// A user's wallet.
///
/// Balance changes only happen through [`Wallet::credit`] and
/// [`Wallet::debit`], which keep the embedded ledger chained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    /// Owner of the wallet.
    pub user_id: UserId,

    /// Current balance in pesewas (100 pesewas = 1 GHS).
    pub balance_pesewas: i64,

    /// Lifetime pesewas credited into the wallet.
    pub lifetime_credited_pesewas: i64,

    /// Lifetime pesewas spent from the wallet.
    pub lifetime_debited_pesewas: i64,

    /// Full ledger, oldest entry first.
    pub entries: Vec<LedgerEntry>,

    /// When the wallet was created.
    pub created_at: DateTime<Utc>,

    /// When the wallet was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Create a new wallet with zero balance and an empty ledger.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            balance_pesewas: 0,
            lifetime_credited_pesewas: 0,
            lifetime_debited_pesewas: 0,
            entries: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether the wallet can cover a debit of `amount_pesewas`.
    #[must_use]
    pub fn has_sufficient_balance(&self, amount_pesewas: i64) -> bool {
        self.balance_pesewas >= amount_pesewas
    }

    /// Credit the wallet and append the matching ledger entry.
    ///
    /// Returns the appended entry, whose `balance_after_pesewas` is the
    /// new wallet balance.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::InvalidAmount`] unless `amount_pesewas` is
    /// strictly positive.
    pub fn credit(
        &mut self,
        entry_type: LedgerEntryType,
        amount_pesewas: i64,
        reference: String,
        description: String,
        metadata: serde_json::Value,
    ) -> Result<&LedgerEntry, WalletError> {
        if amount_pesewas <= 0 {
            return Err(WalletError::InvalidAmount { amount_pesewas });
        }

        let balance_before = self.balance_pesewas;
        let balance_after = balance_before + amount_pesewas;

        let index = self.entries.len();
        self.entries.push(LedgerEntry {
            id: EntryId::generate(),
            entry_type,
            amount_pesewas,
            balance_before_pesewas: balance_before,
            balance_after_pesewas: balance_after,
            reference,
            description,
            metadata,
            created_at: Utc::now(),
        });

        self.balance_pesewas = balance_after;
        self.lifetime_credited_pesewas += amount_pesewas;
        self.updated_at = Utc::now();

        Ok(&self.entries[index])
    }

    /// Debit the wallet and append the matching ledger entry.
    ///
    /// The entry's `amount_pesewas` is stored negative.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::InvalidAmount`] unless `amount_pesewas` is
    /// strictly positive, or [`WalletError::InsufficientBalance`] when the
    /// wallet cannot cover the debit.
    pub fn debit(
        &mut self,
        entry_type: LedgerEntryType,
        amount_pesewas: i64,
        reference: String,
        description: String,
        metadata: serde_json::Value,
    ) -> Result<&LedgerEntry, WalletError> {
        if amount_pesewas <= 0 {
            return Err(WalletError::InvalidAmount { amount_pesewas });
        }
        if !self.has_sufficient_balance(amount_pesewas) {
            return Err(WalletError::InsufficientBalance {
                balance_pesewas: self.balance_pesewas,
                requested_pesewas: amount_pesewas,
            });
        }

        let balance_before = self.balance_pesewas;
        let balance_after = balance_before - amount_pesewas;

        let index = self.entries.len();
        self.entries.push(LedgerEntry {
            id: EntryId::generate(),
            entry_type,
            amount_pesewas: -amount_pesewas,
            balance_before_pesewas: balance_before,
            balance_after_pesewas: balance_after,
            reference,
            description,
            metadata,
            created_at: Utc::now(),
        });

        self.balance_pesewas = balance_after;
        self.lifetime_debited_pesewas += amount_pesewas;
        self.updated_at = Utc::now();

        Ok(&self.entries[index])
    }

    /// Verify the ledger chain.
    ///
    /// Checks that the first entry starts from zero, every entry's before
    /// balance matches the previous entry's after balance, each entry's
    /// arithmetic is internally consistent, and the final after balance
    /// equals the wallet balance.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::ChainViolation`] naming the first entry that
    /// breaks the chain.
    pub fn verify_chain(&self) -> Result<(), WalletError> {
        let mut expected_before = 0i64;
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.balance_before_pesewas != expected_before {
                return Err(WalletError::ChainViolation { index });
            }
            if entry.balance_before_pesewas + entry.amount_pesewas != entry.balance_after_pesewas {
                return Err(WalletError::ChainViolation { index });
            }
            expected_before = entry.balance_after_pesewas;
        }
        if expected_before != self.balance_pesewas {
            return Err(WalletError::ChainViolation {
                index: self.entries.len(),
            });
        }
        Ok(())
    }
}

/// One balance change in a wallet's ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique entry ID (ULID for time-ordering).
    pub id: EntryId,

    /// What kind of change this is.
    pub entry_type: LedgerEntryType,

    /// Amount in pesewas. Positive = credit, negative = debit.
    pub amount_pesewas: i64,

    /// Balance before this entry (in pesewas).
    pub balance_before_pesewas: i64,

    /// Balance after this entry (in pesewas).
    pub balance_after_pesewas: i64,

    /// The deposit reference or order ID this entry settles.
    pub reference: String,

    /// Human-readable description.
    pub description: String,

    /// Additional metadata (gateway channel, bundle ID, etc.).
    pub metadata: serde_json::Value,

    /// When the entry was appended.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Whether this entry increased the balance.
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        self.amount_pesewas > 0
    }
}

/// Kind of wallet ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    /// Gateway deposit credited to the wallet.
    Deposit,

    /// Data bundle purchase paid from the wallet.
    Purchase,

    /// Refund issued for a failed or reversed purchase.
    Refund,

    /// Manual correction by an operator. May go either direction.
    Adjustment,
}

/// Errors from wallet operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    /// The amount must be strictly positive.
    #[error("invalid amount: {amount_pesewas} pesewas")]
    InvalidAmount {
        /// The rejected amount.
        amount_pesewas: i64,
    },

    /// The wallet cannot cover the requested debit.
    #[error("insufficient balance: have {balance_pesewas}, need {requested_pesewas}")]
    InsufficientBalance {
        /// Current balance in pesewas.
        balance_pesewas: i64,
        /// Requested debit in pesewas.
        requested_pesewas: i64,
    },

    /// The ledger chain is broken at the given entry index.
    #[error("ledger chain violation at entry {index}")]
    ChainViolation {
        /// Index of the first inconsistent entry; equals the ledger length
        /// when the final balance does not match the wallet balance.
        index: usize,
    },
}
