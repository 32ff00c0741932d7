//! Deposit transaction types.
//!
//! A `DepositTransaction` is one row per deposit attempt: created
//! `Pending` by the initiation endpoint, moved to exactly one terminal
//! state by the reconciliation engine, and never deleted (audit trail).
//! The `processing` / `processing_started_at` pair is the per-reference
//! processing lock; only the store may flip it, and only through the
//! atomic claim operation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{DepositReference, UserId};

/// Lifecycle state of a deposit.
///
/// Transitions are monotonic: `Pending` may move to any terminal state,
/// and terminal states never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositStatus {
    /// Awaiting payment confirmation.
    Pending,

    /// Verified and credited to the wallet.
    Completed,

    /// The gateway reported a definitive failure.
    Failed,

    /// Expired unpaid and cancelled by the cleanup sweep.
    Cancelled,
}

impl DepositStatus {
    /// Whether this state absorbs all further transitions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// One deposit attempt, keyed by its reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositTransaction {
    /// Globally unique deposit reference (immutable).
    pub reference: DepositReference,

    /// Owner of the deposit.
    pub user_id: UserId,

    /// Wallet-credit amount in pesewas (fee-exclusive).
    pub amount_pesewas: i64,

    /// Expected gateway charge in pesewas (amount plus fee surcharge).
    ///
    /// The amount-consistency check at commit time compares the gateway's
    /// reported figure against this field, within a fixed tolerance.
    pub charged_pesewas: i64,

    /// Current lifecycle state.
    pub status: DepositStatus,

    /// Whether a reconciliation attempt currently holds this deposit.
    pub processing: bool,

    /// When the current (or last) claim was taken.
    pub processing_started_at: Option<DateTime<Utc>>,

    /// Key of the attempt that claimed (and possibly completed) this
    /// deposit; set atomically by the successful claim.
    pub idempotency_key: Option<String>,

    /// Wallet balance snapshot recorded at commit, so replays can answer
    /// without recomputing.
    pub new_balance_pesewas: Option<i64>,

    /// Gateway-side transaction id recorded at commit.
    pub gateway_reference: Option<String>,

    /// Payment channel reported by the gateway (card, mobile money, ...).
    pub channel: Option<String>,

    /// When the gateway reports the charge was paid.
    pub paid_at: Option<DateTime<Utc>>,

    /// Last release/reaper/mismatch annotation.
    pub last_error: Option<String>,

    /// When the deposit was initiated.
    pub created_at: DateTime<Utc>,

    /// When the record was last written.
    pub updated_at: DateTime<Utc>,

    /// When the deposit reached `Completed`.
    pub completed_at: Option<DateTime<Utc>>,
}

impl DepositTransaction {
    /// Create a new pending deposit.
    #[must_use]
    pub fn pending(
        reference: DepositReference,
        user_id: UserId,
        amount_pesewas: i64,
        charged_pesewas: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            reference,
            user_id,
            amount_pesewas,
            charged_pesewas,
            status: DepositStatus::Pending,
            processing: false,
            processing_started_at: None,
            idempotency_key: None,
            new_balance_pesewas: None,
            gateway_reference: None,
            channel: None,
            paid_at: None,
            last_error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Whether a claim attempt at `now` may take this deposit.
    ///
    /// True only for pending deposits that are unclaimed, or whose claim
    /// is older than `stale_after` (an abandoned lock from a crashed or
    /// hung attempt).
    #[must_use]
    pub fn is_claimable(&self, stale_after: Duration, now: DateTime<Utc>) -> bool {
        if self.status != DepositStatus::Pending {
            return false;
        }
        if !self.processing {
            return true;
        }
        // A processing flag without a start timestamp cannot be proven
        // live, so it counts as stale.
        match self.processing_started_at {
            None => true,
            Some(started) => now - started > stale_after,
        }
    }
}
