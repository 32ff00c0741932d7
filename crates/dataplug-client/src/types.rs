//! Request and response types for the dataplug client.

use chrono::{DateTime, Utc};
use dataplug_core::DepositStatus;
use serde::{Deserialize, Serialize};

/// Request to start a new deposit.
#[derive(Debug, Clone, Serialize)]
pub struct InitiateDepositRequest {
    /// Amount to credit to the wallet, in pesewas (fees are added on top).
    pub amount_pesewas: i64,
    /// Customer email forwarded to the gateway checkout page.
    pub email: String,
}

/// Response to a deposit initiation.
#[derive(Debug, Clone, Deserialize)]
pub struct InitiateDepositResponse {
    /// Deposit reference to poll and to expect on the webhook.
    pub reference: String,
    /// Hosted checkout URL to redirect the customer to.
    pub authorization_url: String,
    /// Gateway access code for inline checkout widgets.
    pub access_code: String,
    /// Amount that will be credited, in pesewas.
    pub amount_pesewas: i64,
    /// Processing fee, in pesewas.
    pub fee_pesewas: i64,
    /// Total the customer pays, in pesewas.
    pub charged_pesewas: i64,
}

/// Response to a verification request.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyDepositResponse {
    /// Whether the deposit has been credited.
    pub success: bool,
    /// Deposit status label (`completed`, `pending`, `failed`, `cancelled`).
    pub status: String,
    /// Wallet balance after the credit, when completed.
    pub new_balance_pesewas: Option<i64>,
}

/// A deposit record as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct DepositRecord {
    /// Deposit reference.
    pub reference: String,
    /// Amount to credit, in pesewas.
    pub amount_pesewas: i64,
    /// Total charged to the customer, in pesewas.
    pub charged_pesewas: i64,
    /// Current status.
    pub status: DepositStatus,
    /// Wallet balance after the credit, when completed.
    pub new_balance_pesewas: Option<i64>,
    /// Payment channel reported by the gateway.
    pub channel: Option<String>,
    /// Gateway-side transaction id.
    pub gateway_reference: Option<String>,
    /// Last recorded processing error.
    pub last_error: Option<String>,
    /// When the customer paid, per the gateway.
    pub paid_at: Option<DateTime<Utc>>,
    /// When the deposit was created.
    pub created_at: DateTime<Utc>,
    /// When the deposit reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
}

/// A page of deposit records.
#[derive(Debug, Clone, Deserialize)]
pub struct DepositListResponse {
    /// Deposits, newest first.
    pub deposits: Vec<DepositRecord>,
    /// Whether more records exist past this page.
    pub has_more: bool,
}

/// Wallet balance response.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletResponse {
    /// Current balance in pesewas.
    pub balance_pesewas: i64,
    /// Balance formatted for display (`GHS 50.98`).
    pub balance_formatted: String,
    /// Total ever credited, in pesewas.
    pub lifetime_credited_pesewas: i64,
    /// Total ever debited, in pesewas.
    pub lifetime_debited_pesewas: i64,
}

/// A wallet ledger entry as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerEntryRecord {
    /// Entry id.
    pub id: String,
    /// Entry type (`deposit`, `purchase`, `refund`, `adjustment`).
    pub entry_type: String,
    /// Signed amount in pesewas.
    pub amount_pesewas: i64,
    /// Balance before this entry, in pesewas.
    pub balance_before_pesewas: i64,
    /// Balance after this entry, in pesewas.
    pub balance_after_pesewas: i64,
    /// Reference tying the entry to its source transaction.
    pub reference: String,
    /// Human-readable description.
    pub description: String,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
}

/// A page of ledger entries.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerResponse {
    /// Entries, newest first.
    pub entries: Vec<LedgerEntryRecord>,
    /// Whether more entries exist past this page.
    pub has_more: bool,
}

/// Health check response.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
}

/// API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiErrorBody,
}

/// API error body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
    /// Additional details.
    pub details: Option<serde_json::Value>,
}
