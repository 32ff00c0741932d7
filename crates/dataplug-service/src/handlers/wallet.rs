//! Wallet balance and ledger handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use dataplug_core::LedgerEntry;
use dataplug_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Wallet balance response.
#[derive(Debug, Serialize)]
pub struct WalletResponse {
    /// Balance in pesewas.
    pub balance_pesewas: i64,
    /// Balance formatted as Ghana cedis.
    pub balance_formatted: String,
    /// Total ever credited, in pesewas.
    pub lifetime_credited_pesewas: i64,
    /// Total ever debited, in pesewas.
    pub lifetime_debited_pesewas: i64,
}

/// Get the current wallet balance.
///
/// A user with no wallet yet reads as a zero balance; the wallet record
/// is only created by the first credit.
pub async fn get_wallet(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<WalletResponse>, ApiError> {
    let wallet = state.store.get_wallet(&auth.user_id)?;

    let response = match wallet {
        Some(wallet) => WalletResponse {
            balance_pesewas: wallet.balance_pesewas,
            balance_formatted: format_pesewas(wallet.balance_pesewas),
            lifetime_credited_pesewas: wallet.lifetime_credited_pesewas,
            lifetime_debited_pesewas: wallet.lifetime_debited_pesewas,
        },
        None => WalletResponse {
            balance_pesewas: 0,
            balance_formatted: format_pesewas(0),
            lifetime_credited_pesewas: 0,
            lifetime_debited_pesewas: 0,
        },
    };

    Ok(Json(response))
}

/// Ledger list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListLedgerQuery {
    /// Maximum number of entries to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Ledger entry response.
#[derive(Debug, Serialize)]
pub struct LedgerEntryResponse {
    /// Entry ID.
    pub id: String,
    /// Entry type.
    pub entry_type: String,
    /// Amount in pesewas (positive = credit, negative = debit).
    pub amount_pesewas: i64,
    /// Balance before this entry.
    pub balance_before_pesewas: i64,
    /// Balance after this entry.
    pub balance_after_pesewas: i64,
    /// Reference that produced this entry.
    pub reference: String,
    /// Description.
    pub description: String,
    /// Timestamp.
    pub created_at: String,
}

impl From<&LedgerEntry> for LedgerEntryResponse {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            entry_type: format!("{:?}", entry.entry_type).to_lowercase(),
            amount_pesewas: entry.amount_pesewas,
            balance_before_pesewas: entry.balance_before_pesewas,
            balance_after_pesewas: entry.balance_after_pesewas,
            reference: entry.reference.clone(),
            description: entry.description.clone(),
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// Ledger list response.
#[derive(Debug, Serialize)]
pub struct ListLedgerResponse {
    /// Ledger entries (newest first).
    pub entries: Vec<LedgerEntryResponse>,
    /// Whether there are more entries.
    pub has_more: bool,
}

/// List wallet ledger entries.
pub async fn list_ledger(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListLedgerQuery>,
) -> Result<Json<ListLedgerResponse>, ApiError> {
    let limit = query.limit.min(100);

    let Some(wallet) = state.store.get_wallet(&auth.user_id)? else {
        return Ok(Json(ListLedgerResponse {
            entries: Vec::new(),
            has_more: false,
        }));
    };

    // Entries are stored append-only, oldest first
    let entries: Vec<_> = wallet
        .entries
        .iter()
        .rev()
        .skip(query.offset)
        .take(limit)
        .map(LedgerEntryResponse::from)
        .collect();
    let has_more = wallet.entries.len() > query.offset + entries.len();

    Ok(Json(ListLedgerResponse { entries, has_more }))
}

fn format_pesewas(pesewas: i64) -> String {
    format!("GHS {}.{:02}", pesewas / 100, (pesewas % 100).abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_pesewas_as_cedis() {
        assert_eq!(format_pesewas(0), "GHS 0.00");
        assert_eq!(format_pesewas(5), "GHS 0.05");
        assert_eq!(format_pesewas(100), "GHS 1.00");
        assert_eq!(format_pesewas(5098), "GHS 50.98");
    }
}
