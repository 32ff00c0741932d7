//! Paystack webhook handler.
//!
//! The webhook is a delivery hint, not a verdict: after the signature
//! check the payload only tells us which reference to reconcile. The
//! engine re-verifies against the gateway API before any money moves, so
//! a forged-but-signed body can at worst trigger a harmless lookup.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use dataplug_core::DepositReference;
use dataplug_gateway::WebhookEvent;

use crate::crypto;
use crate::error::ApiError;
use crate::reconcile::{ReconcileError, ReconcileOutcome, Trigger};
use crate::state::AppState;

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was accepted.
    pub received: bool,
}

/// Handle Paystack webhooks.
///
/// Signature verification runs against the raw body before anything is
/// parsed or read from the store. Recognized outcomes are acked with 200
/// so Paystack stops redelivering; infrastructure trouble answers 5xx so
/// it retries.
pub async fn paystack_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    // Signature first. No secret means no way to verify; fail closed.
    let Some(secret) = state.config.paystack_secret_key.as_ref() else {
        tracing::warn!("Paystack secret not configured, rejecting webhook");
        return Err(ApiError::Unauthorized);
    };

    let signature = headers
        .get("x-paystack-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Webhook missing x-paystack-signature header");
            ApiError::Unauthorized
        })?;

    let expected = crypto::hmac_sha512_hex(secret, &body);
    if !crypto::constant_time_eq(&expected, signature) {
        tracing::warn!("Webhook signature verification failed");
        return Err(ApiError::Unauthorized);
    }

    // Parse webhook payload
    let event: WebhookEvent =
        serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(
        event = %event.event,
        reference = %event.data.reference,
        "Received Paystack webhook"
    );

    // Only charge lifecycle events carry a reference we reconcile
    if !event.event.starts_with("charge.") {
        tracing::debug!(event = %event.event, "Ignoring non-charge webhook event");
        return Ok(Json(WebhookResponse { received: true }));
    }

    let Ok(reference) = event.data.reference.parse::<DepositReference>() else {
        // Signed and well-formed, but not one of our references
        tracing::warn!(
            reference = %event.data.reference,
            "Webhook reference does not match deposit format"
        );
        return Ok(Json(WebhookResponse { received: true }));
    };

    let Some(reconciler) = state.reconciler.as_ref() else {
        tracing::error!("Webhook received but gateway client not configured");
        return Err(ApiError::BadGateway("Payment gateway not configured".into()));
    };

    match reconciler.process(&reference, Trigger::Webhook).await {
        Ok(outcome) => {
            match &outcome {
                ReconcileOutcome::Credited { deposit } => {
                    tracing::info!(
                        reference = %reference,
                        amount_pesewas = deposit.amount_pesewas,
                        "Webhook credited deposit"
                    );
                }
                ReconcileOutcome::AlreadyCompleted { .. } => {
                    tracing::info!(reference = %reference, "Webhook replay for completed deposit");
                }
                ReconcileOutcome::StillPending => {
                    tracing::info!(reference = %reference, "Webhook for unsettled charge");
                }
                ReconcileOutcome::InFlight => {
                    tracing::info!(reference = %reference, "Webhook lost claim race");
                }
                ReconcileOutcome::Rejected { status } => {
                    tracing::info!(reference = %reference, status = ?status, "Webhook for failed charge");
                }
            }
            Ok(Json(WebhookResponse { received: true }))
        }
        // Acked: redelivery cannot change these verdicts
        Err(ReconcileError::NotFound) => {
            tracing::warn!(reference = %reference, "Webhook for unknown deposit");
            Ok(Json(WebhookResponse { received: true }))
        }
        Err(ReconcileError::AmountMismatch {
            expected_pesewas,
            reported_pesewas,
        }) => {
            tracing::warn!(
                reference = %reference,
                expected_pesewas = expected_pesewas,
                reported_pesewas = reported_pesewas,
                "Webhook amount mismatch, deposit held for review"
            );
            Ok(Json(WebhookResponse { received: true }))
        }
        // Not acked: Paystack redelivers and the attempt is replay-safe
        Err(ReconcileError::Gateway(e)) => {
            tracing::error!(reference = %reference, error = %e, "Gateway verify failed during webhook");
            Err(ApiError::BadGateway(e.to_string()))
        }
        Err(ReconcileError::Store(e)) => {
            tracing::error!(reference = %reference, error = %e, "Store failure during webhook");
            Err(ApiError::from(e))
        }
    }
}
