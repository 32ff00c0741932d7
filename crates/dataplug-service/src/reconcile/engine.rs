//! The reconciliation engine.
//!
//! Every path that can settle a deposit - webhook delivery, customer
//! polling, admin force-verify - funnels into [`Reconciler::process`].
//! The engine claims the deposit, asks the gateway what actually
//! happened to the charge, and either commits the wallet credit, records
//! the failure, or releases the claim for a later attempt. The claim
//! protocol in the store guarantees that concurrent attempts credit the
//! wallet at most once; this module guarantees that a verdict is only
//! ever derived from the gateway, never from the caller's payload.

use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use dataplug_core::{DepositReference, DepositStatus, DepositTransaction};
use dataplug_gateway::{ChargeOutcome, GatewayClient, GatewayError, RetryPolicy};
use dataplug_store::{ClaimOutcome, RocksStore, SettlementDetails, Store, StoreError};

use super::cache::{CachedVerdict, VerificationCache};

/// Largest gap tolerated between the expected charge and what the gateway
/// reports as paid, in pesewas. Covers rounding differences in the
/// gateway's fee math; anything larger leaves the deposit pending for
/// manual review instead of crediting.
pub const AMOUNT_TOLERANCE_PESEWAS: i64 = 50;

/// What prompted a reconciliation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Gateway webhook delivery.
    Webhook,
    /// Customer polling from the storefront.
    ClientVerify,
    /// Back-office force verification.
    AdminVerify,
}

impl Trigger {
    /// Prefix for per-attempt idempotency keys, so a stored claim records
    /// which path minted it.
    fn key_prefix(self) -> &'static str {
        match self {
            Self::Webhook => "wh-",
            Self::ClientVerify => "cv-",
            Self::AdminVerify => "av-",
        }
    }

    /// Only the client-poll path honors pending damping; webhooks carry
    /// fresh information and admins explicitly want a new look.
    fn is_client_poll(self) -> bool {
        matches!(self, Self::ClientVerify)
    }
}

/// Result of a reconciliation attempt that reached a verdict.
#[derive(Debug)]
pub enum ReconcileOutcome {
    /// This attempt credited the wallet.
    Credited {
        /// The completed deposit, carrying the balance snapshot.
        deposit: DepositTransaction,
    },

    /// An earlier attempt already credited; the stored snapshot answers.
    AlreadyCompleted {
        /// The completed deposit as recorded at commit time.
        deposit: DepositTransaction,
    },

    /// The gateway has not settled the charge yet.
    StillPending,

    /// Another attempt holds the claim right now.
    InFlight,

    /// The deposit is terminally failed or cancelled.
    Rejected {
        /// The terminal status.
        status: DepositStatus,
    },
}

/// Reconciliation failures.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// No deposit exists under this reference.
    #[error("deposit not found")]
    NotFound,

    /// The gateway settled an amount outside tolerance of the expected
    /// charge. The deposit stays pending, annotated for review.
    #[error("amount mismatch: expected {expected_pesewas}, gateway reported {reported_pesewas}")]
    AmountMismatch {
        /// The fee-inclusive charge we initialized.
        expected_pesewas: i64,
        /// What the gateway says was paid.
        reported_pesewas: i64,
    },

    /// The gateway could not answer (transport trouble, 5xx, rate limit).
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The reconciliation engine shared by all settlement paths.
pub struct Reconciler {
    store: Arc<RocksStore>,
    gateway: Arc<GatewayClient>,
    cache: VerificationCache,
    stale_after: Duration,
    retry: RetryPolicy,
}

impl Reconciler {
    /// Create an engine over a store and gateway client.
    ///
    /// `stale_after` is the age past which a held claim counts as
    /// abandoned and may be taken over.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, gateway: Arc<GatewayClient>, stale_after: Duration) -> Self {
        Self {
            store,
            gateway,
            cache: VerificationCache::new(),
            stale_after,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the gateway retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run one reconciliation attempt for a deposit.
    ///
    /// Safe to call any number of times from any path; at most one call
    /// ever credits the wallet.
    ///
    /// # Errors
    ///
    /// - [`ReconcileError::NotFound`] for an unknown reference.
    /// - [`ReconcileError::AmountMismatch`] when the settled amount is out
    ///   of tolerance; the deposit stays pending.
    /// - [`ReconcileError::Gateway`] when the gateway cannot answer; the
    ///   claim has been released and the attempt may be repeated.
    /// - [`ReconcileError::Store`] on storage failure.
    pub async fn process(
        &self,
        reference: &DepositReference,
        trigger: Trigger,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        // Recent verdicts answer without touching the claim path.
        match self.cache.get(reference).await {
            Some(CachedVerdict::Completed(deposit)) => {
                return Ok(ReconcileOutcome::AlreadyCompleted { deposit: *deposit });
            }
            Some(CachedVerdict::Pending) if trigger.is_client_poll() => {
                return Ok(ReconcileOutcome::StillPending);
            }
            _ => {}
        }

        let Some(deposit) = self.store.get_deposit(reference)? else {
            return Err(ReconcileError::NotFound);
        };
        if deposit.status.is_terminal() {
            return Ok(self.terminal_outcome(reference, deposit).await);
        }

        // Claim the deposit for this attempt. Losing the race is a normal
        // outcome; the winner will answer for all of us.
        let key = format!("{}{}", trigger.key_prefix(), Uuid::new_v4().simple());
        let claimed = match self.store.claim_deposit(reference, &key, self.stale_after)? {
            ClaimOutcome::Claimed(deposit) => deposit,
            ClaimOutcome::Busy => return Ok(ReconcileOutcome::InFlight),
            ClaimOutcome::Terminal(deposit) => {
                return Ok(self.terminal_outcome(reference, deposit).await);
            }
        };

        // The only network wait. On trouble the claim is released in the
        // same request so a repoll can take over immediately.
        let verified = match self.gateway.verify(reference.as_str(), &self.retry).await {
            Ok(verified) => verified,
            Err(e) => {
                self.release(reference, &key, Some(&format!("gateway verify failed: {e}")));
                return Err(ReconcileError::Gateway(e));
            }
        };

        match verified.outcome {
            ChargeOutcome::Success => {
                self.settle(reference, &key, &claimed, &verified, trigger)
                    .await
            }
            ChargeOutcome::Pending => {
                self.release(reference, &key, None);
                self.cache.put_pending(reference).await;
                tracing::debug!(
                    reference = %reference,
                    gateway_status = %verified.gateway_status,
                    "Charge not settled yet"
                );
                Ok(ReconcileOutcome::StillPending)
            }
            ChargeOutcome::Failed => {
                let reason = format!("gateway reported charge as {}", verified.gateway_status);
                let failed = self.store.mark_failed(reference, &key, &reason)?;
                self.cache.evict(reference).await;
                tracing::info!(
                    reference = %reference,
                    gateway_status = %verified.gateway_status,
                    "Deposit failed at gateway"
                );
                Ok(ReconcileOutcome::Rejected {
                    status: failed.status,
                })
            }
        }
    }

    /// Commit a successful charge after the amount consistency check.
    async fn settle(
        &self,
        reference: &DepositReference,
        key: &str,
        claimed: &DepositTransaction,
        verified: &dataplug_gateway::VerifiedCharge,
        trigger: Trigger,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let expected = claimed.charged_pesewas;
        let reported = verified.amount_pesewas;

        if !within_tolerance(expected, reported) {
            let note = format!("amount mismatch: gateway reported {reported}, expected {expected}");
            self.release(reference, key, Some(&note));
            tracing::warn!(
                reference = %reference,
                expected_pesewas = expected,
                reported_pesewas = reported,
                "Amount mismatch, leaving deposit pending for review"
            );
            return Err(ReconcileError::AmountMismatch {
                expected_pesewas: expected,
                reported_pesewas: reported,
            });
        }

        let settlement = SettlementDetails {
            gateway_reference: verified.gateway_reference.clone(),
            channel: verified.channel.clone(),
            paid_at: verified.paid_at,
        };

        let deposit = self.store.commit_credit(reference, key, &settlement)?;
        self.cache.put_completed(reference, deposit.clone()).await;

        tracing::info!(
            reference = %reference,
            user_id = %deposit.user_id,
            amount_pesewas = deposit.amount_pesewas,
            new_balance_pesewas = ?deposit.new_balance_pesewas,
            trigger = ?trigger,
            "Deposit credited"
        );

        Ok(ReconcileOutcome::Credited { deposit })
    }

    /// Map a terminal record to its replay answer, refreshing the cache
    /// for completed deposits.
    async fn terminal_outcome(
        &self,
        reference: &DepositReference,
        deposit: DepositTransaction,
    ) -> ReconcileOutcome {
        if deposit.status == DepositStatus::Completed {
            self.cache.put_completed(reference, deposit.clone()).await;
            ReconcileOutcome::AlreadyCompleted { deposit }
        } else {
            ReconcileOutcome::Rejected {
                status: deposit.status,
            }
        }
    }

    /// Best-effort claim release; failures are logged rather than
    /// propagated so the caller can surface the original verdict.
    fn release(&self, reference: &DepositReference, key: &str, error: Option<&str>) {
        if let Err(e) = self.store.release_claim(reference, key, error) {
            tracing::error!(reference = %reference, error = %e, "Failed to release claim");
        }
    }
}

/// Amount consistency check against the fee-inclusive expected charge.
fn within_tolerance(expected_pesewas: i64, reported_pesewas: i64) -> bool {
    (reported_pesewas - expected_pesewas).abs() <= AMOUNT_TOLERANCE_PESEWAS
}
