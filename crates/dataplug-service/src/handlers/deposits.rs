//! Deposit initiation, verification and history handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use dataplug_core::{DepositReference, DepositTransaction};
use dataplug_gateway::InitializeRequest;
use dataplug_store::Store;

use crate::auth::{AdminAuth, AuthUser};
use crate::error::ApiError;
use crate::reconcile::{ReconcileOutcome, Trigger};
use crate::state::AppState;

/// Deposit initiation request.
#[derive(Debug, Deserialize)]
pub struct InitiateDepositRequest {
    /// Wallet credit amount in pesewas, fee-exclusive.
    pub amount_pesewas: i64,
    /// Customer email, required by the gateway checkout page.
    pub email: String,
}

/// Deposit initiation response.
#[derive(Debug, Serialize)]
pub struct InitiateDepositResponse {
    /// The deposit reference to quote when verifying.
    pub reference: String,
    /// Hosted checkout URL where the customer pays.
    pub authorization_url: String,
    /// Gateway access code for the checkout session.
    pub access_code: String,
    /// Wallet credit amount in pesewas.
    pub amount_pesewas: i64,
    /// Gateway surcharge passed on to the customer.
    pub fee_pesewas: i64,
    /// Total the gateway will charge.
    pub charged_pesewas: i64,
}

/// Initiate a deposit: persist the Pending record, then open a hosted
/// checkout session for the fee-inclusive charge.
pub async fn initiate_deposit(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<InitiateDepositRequest>,
) -> Result<Json<InitiateDepositResponse>, ApiError> {
    // Validate amount bounds
    if body.amount_pesewas < state.config.deposit_min_pesewas {
        return Err(ApiError::BadRequest(format!(
            "Minimum deposit is {} pesewas",
            state.config.deposit_min_pesewas
        )));
    }
    if body.amount_pesewas > state.config.deposit_max_pesewas {
        return Err(ApiError::BadRequest(format!(
            "Maximum deposit is {} pesewas",
            state.config.deposit_max_pesewas
        )));
    }
    if !body.email.contains('@') {
        return Err(ApiError::BadRequest("A valid email is required".into()));
    }

    // Verify the gateway is configured
    let gateway = state
        .gateway
        .as_ref()
        .ok_or_else(|| ApiError::BadGateway("Payment gateway not configured".into()))?;

    let reference = DepositReference::generate();
    let fee_pesewas = state.config.fees.fee_pesewas(body.amount_pesewas);
    let charged_pesewas = state.config.fees.charged_pesewas(body.amount_pesewas);

    // Persist before talking to the gateway so a webhook arriving mid-call
    // finds the record. An initiation that fails past this point leaves a
    // Pending deposit behind; the expiry sweep cancels it.
    let deposit = DepositTransaction::pending(
        reference.clone(),
        auth.user_id,
        body.amount_pesewas,
        charged_pesewas,
    );
    state.store.create_deposit(&deposit)?;

    tracing::info!(
        reference = %reference,
        user_id = %auth.user_id,
        amount_pesewas = body.amount_pesewas,
        charged_pesewas = charged_pesewas,
        "Initiating deposit"
    );

    let callback_url = format!(
        "{}/wallet/deposit?reference={}",
        state.config.frontend_url,
        reference.as_str()
    );

    let initialized = gateway
        .initialize(&InitializeRequest {
            email: body.email,
            amount_pesewas: charged_pesewas,
            reference: reference.as_str().to_string(),
            currency: "GHS".to_string(),
            callback_url: Some(callback_url),
        })
        .await
        .map_err(|e| {
            tracing::error!(reference = %reference, error = %e, "Failed to initialize charge");
            ApiError::BadGateway(format!("Failed to initialize charge: {e}"))
        })?;

    Ok(Json(InitiateDepositResponse {
        reference: reference.as_str().to_string(),
        authorization_url: initialized.authorization_url,
        access_code: initialized.access_code,
        amount_pesewas: body.amount_pesewas,
        fee_pesewas,
        charged_pesewas,
    }))
}

/// Verification response.
#[derive(Debug, Serialize)]
pub struct VerifyDepositResponse {
    /// Whether the deposit is settled and credited.
    pub success: bool,
    /// Current deposit status.
    pub status: String,
    /// Wallet balance after the credit, present once completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_balance_pesewas: Option<i64>,
}

/// Verify a deposit on behalf of the owning customer.
///
/// Drives one reconciliation attempt; safe to poll repeatedly.
pub async fn verify_deposit(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(reference): Path<String>,
) -> Result<Json<VerifyDepositResponse>, ApiError> {
    let reference = parse_reference(&reference)?;

    // Ownership check before any gateway traffic. Unknown and foreign
    // references answer identically.
    let deposit = state
        .store
        .get_deposit(&reference)?
        .ok_or_else(|| ApiError::NotFound("Deposit not found".into()))?;
    if deposit.user_id != auth.user_id {
        return Err(ApiError::NotFound("Deposit not found".into()));
    }

    run_verification(&state, &reference, Trigger::ClientVerify).await
}

/// Force verification of any deposit from the back office.
///
/// Same engine as the customer path, but skips the ownership check and
/// the pending damping cache.
pub async fn admin_verify_deposit(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Path(reference): Path<String>,
) -> Result<Json<VerifyDepositResponse>, ApiError> {
    let reference = parse_reference(&reference)?;

    tracing::info!(
        reference = %reference,
        admin_id = %admin.admin_id,
        "Admin force verification"
    );

    run_verification(&state, &reference, Trigger::AdminVerify).await
}

async fn run_verification(
    state: &AppState,
    reference: &DepositReference,
    trigger: Trigger,
) -> Result<Json<VerifyDepositResponse>, ApiError> {
    let reconciler = state
        .reconciler
        .as_ref()
        .ok_or_else(|| ApiError::BadGateway("Payment gateway not configured".into()))?;

    let outcome = reconciler.process(reference, trigger).await?;

    let response = match outcome {
        ReconcileOutcome::Credited { deposit } | ReconcileOutcome::AlreadyCompleted { deposit } => {
            VerifyDepositResponse {
                success: true,
                status: status_label(deposit.status),
                new_balance_pesewas: deposit.new_balance_pesewas,
            }
        }
        ReconcileOutcome::StillPending => VerifyDepositResponse {
            success: false,
            status: "pending".to_string(),
            new_balance_pesewas: None,
        },
        ReconcileOutcome::Rejected { status } => VerifyDepositResponse {
            success: false,
            status: status_label(status),
            new_balance_pesewas: None,
        },
        ReconcileOutcome::InFlight => {
            return Err(ApiError::Conflict(
                "Verification already in progress, retry shortly".into(),
            ));
        }
    };

    Ok(Json(response))
}

/// Deposit list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListDepositsQuery {
    /// Maximum number of deposits to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Deposit record response.
#[derive(Debug, Serialize)]
pub struct DepositResponse {
    /// Deposit reference.
    pub reference: String,
    /// Wallet credit amount in pesewas.
    pub amount_pesewas: i64,
    /// Fee-inclusive amount charged at the gateway.
    pub charged_pesewas: i64,
    /// Deposit status.
    pub status: String,
    /// Balance snapshot recorded at commit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_balance_pesewas: Option<i64>,
    /// Payment channel reported by the gateway.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Gateway-side transaction ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_reference: Option<String>,
    /// Last reconciliation annotation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// When the customer paid, per the gateway.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<String>,
    /// When the deposit was initiated.
    pub created_at: String,
    /// When the deposit completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl From<&DepositTransaction> for DepositResponse {
    fn from(deposit: &DepositTransaction) -> Self {
        Self {
            reference: deposit.reference.as_str().to_string(),
            amount_pesewas: deposit.amount_pesewas,
            charged_pesewas: deposit.charged_pesewas,
            status: status_label(deposit.status),
            new_balance_pesewas: deposit.new_balance_pesewas,
            channel: deposit.channel.clone(),
            gateway_reference: deposit.gateway_reference.clone(),
            last_error: deposit.last_error.clone(),
            paid_at: deposit.paid_at.map(|t| t.to_rfc3339()),
            created_at: deposit.created_at.to_rfc3339(),
            completed_at: deposit.completed_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Deposit list response.
#[derive(Debug, Serialize)]
pub struct ListDepositsResponse {
    /// Deposits (newest first).
    pub deposits: Vec<DepositResponse>,
    /// Whether there are more deposits.
    pub has_more: bool,
}

/// Get one deposit record.
pub async fn get_deposit(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(reference): Path<String>,
) -> Result<Json<DepositResponse>, ApiError> {
    let reference = parse_reference(&reference)?;

    let deposit = state
        .store
        .get_deposit(&reference)?
        .ok_or_else(|| ApiError::NotFound("Deposit not found".into()))?;
    if deposit.user_id != auth.user_id {
        return Err(ApiError::NotFound("Deposit not found".into()));
    }

    Ok(Json(DepositResponse::from(&deposit)))
}

/// List deposit history.
pub async fn list_deposits(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListDepositsQuery>,
) -> Result<Json<ListDepositsResponse>, ApiError> {
    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(100);
    let deposits = state
        .store
        .list_deposits_by_user(&auth.user_id, limit + 1, query.offset)?;

    let has_more = deposits.len() > limit;
    let deposits: Vec<_> = deposits
        .iter()
        .take(limit)
        .map(DepositResponse::from)
        .collect();

    Ok(Json(ListDepositsResponse { deposits, has_more }))
}

fn parse_reference(raw: &str) -> Result<DepositReference, ApiError> {
    raw.parse::<DepositReference>()
        .map_err(|_| ApiError::BadRequest("Invalid deposit reference".into()))
}

fn status_label(status: dataplug_core::DepositStatus) -> String {
    format!("{status:?}").to_lowercase()
}
