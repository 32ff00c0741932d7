//! Wire types for the Paystack transaction API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Standard gateway response envelope.
///
/// Every endpoint answers `{status, message, data}` where `status` is the
/// request-level verdict (not the charge verdict).
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    /// Whether the API call itself succeeded.
    pub status: bool,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Endpoint-specific payload.
    pub data: Option<T>,
}

/// Request body for initializing a hosted-checkout transaction.
#[derive(Debug, Clone, Serialize)]
pub struct InitializeRequest {
    /// Customer email (required by the gateway).
    pub email: String,

    /// Charge amount in pesewas.
    #[serde(rename = "amount")]
    pub amount_pesewas: i64,

    /// Our deposit reference; the gateway echoes it back in webhooks and
    /// redirect callbacks.
    pub reference: String,

    /// ISO currency code (`GHS`).
    pub currency: String,

    /// Where the gateway redirects the customer after payment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

/// A successfully initialized transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializedCharge {
    /// Hosted checkout page the customer is sent to.
    pub authorization_url: String,

    /// Gateway access code for the inline checkout widget.
    pub access_code: String,

    /// The deposit reference, echoed back.
    pub reference: String,
}

/// Raw verification payload from `GET /transaction/verify/{reference}`.
#[derive(Debug, Deserialize)]
pub(crate) struct VerifyData {
    /// Gateway charge status string.
    pub status: String,

    /// Amount actually charged, in pesewas.
    pub amount: i64,

    /// Gateway-side numeric transaction ID.
    #[serde(default)]
    pub id: Option<u64>,

    /// Payment channel (card, `mobile_money`, ...).
    #[serde(default)]
    pub channel: Option<String>,

    /// When the charge was paid.
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

/// The tri-state verdict of a charge verification.
///
/// Gateway status strings collapse into three cases so the reconciliation
/// engine never branches on raw strings. Anything unrecognized maps to
/// `Pending`: a status we cannot interpret must neither credit nor fail a
/// deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeOutcome {
    /// The customer paid and the charge settled.
    Success,

    /// The charge has not concluded (customer abandoned the page, payment
    /// still processing, queued, ...). Worth asking again later.
    Pending,

    /// The gateway reports a definitive failure (declined or reversed).
    Failed,
}

impl ChargeOutcome {
    /// Map a gateway charge status string to an outcome.
    #[must_use]
    pub fn from_status(status: &str) -> Self {
        match status {
            "success" => Self::Success,
            "failed" | "reversed" => Self::Failed,
            "abandoned" | "ongoing" | "pending" | "processing" | "queued" => Self::Pending,
            other => {
                tracing::warn!(status = %other, "unrecognized gateway charge status");
                Self::Pending
            }
        }
    }
}

/// A verified charge, as the reconciliation engine consumes it.
#[derive(Debug, Clone)]
pub struct VerifiedCharge {
    /// Tri-state verdict.
    pub outcome: ChargeOutcome,

    /// Amount the gateway reports was charged, in pesewas.
    pub amount_pesewas: i64,

    /// When the charge was paid, if it was.
    pub paid_at: Option<DateTime<Utc>>,

    /// Payment channel.
    pub channel: Option<String>,

    /// Gateway-side transaction ID.
    pub gateway_reference: Option<String>,

    /// The raw status string, kept for annotations and logs.
    pub gateway_status: String,
}

/// Webhook envelope posted by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// Event name, e.g. `charge.success`.
    pub event: String,

    /// Charge facts carried by the event.
    pub data: WebhookChargeData,
}

/// Charge data inside a webhook event.
///
/// Only the reference is load-bearing: the reconciliation engine
/// re-verifies through the API rather than trusting pushed amounts.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookChargeData {
    /// The deposit reference this event is about.
    pub reference: String,

    /// Amount as pushed by the gateway. Informational only.
    #[serde(default)]
    pub amount: Option<i64>,

    /// Charge status as pushed by the gateway. Informational only.
    #[serde(default)]
    pub status: Option<String>,

    /// Payment channel.
    #[serde(default)]
    pub channel: Option<String>,
}
