//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials, or a bad webhook signature.
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - another attempt holds the reconciliation claim. Retryable.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Gateway reported a settled amount outside tolerance of what we expected.
    /// The deposit is left Pending for manual review.
    #[error("amount mismatch: expected={expected_pesewas}, reported={reported_pesewas}")]
    AmountMismatch {
        /// What the gateway was asked to charge.
        expected_pesewas: i64,
        /// What the gateway says was paid.
        reported_pesewas: i64,
    },

    /// Transient gateway trouble (timeout, 5xx, rate limit). Retryable.
    #[error("gateway error: {0}")]
    BadGateway(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::AmountMismatch {
                expected_pesewas,
                reported_pesewas,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "amount_mismatch",
                self.to_string(),
                Some(serde_json::json!({
                    "expected_pesewas": expected_pesewas,
                    "reported_pesewas": reported_pesewas
                })),
            ),
            Self::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "gateway_error", msg.clone(), None),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<crate::reconcile::ReconcileError> for ApiError {
    fn from(err: crate::reconcile::ReconcileError) -> Self {
        use crate::reconcile::ReconcileError;
        match err {
            ReconcileError::NotFound => Self::NotFound("deposit not found".into()),
            ReconcileError::AmountMismatch {
                expected_pesewas,
                reported_pesewas,
            } => Self::AmountMismatch {
                expected_pesewas,
                reported_pesewas,
            },
            ReconcileError::Gateway(e) => Self::BadGateway(e.to_string()),
            ReconcileError::Store(e) => Self::from(e),
        }
    }
}

impl From<dataplug_store::StoreError> for ApiError {
    fn from(err: dataplug_store::StoreError) -> Self {
        match err {
            dataplug_store::StoreError::NotFound => Self::NotFound("deposit not found".into()),
            dataplug_store::StoreError::DuplicateReference { reference } => {
                Self::Conflict(format!("deposit {reference} already exists"))
            }
            dataplug_store::StoreError::NotClaimed { reference }
            | dataplug_store::StoreError::ClaimMismatch { reference } => {
                Self::Conflict(format!("deposit {reference} is being processed"))
            }
            dataplug_store::StoreError::Database(msg)
            | dataplug_store::StoreError::Serialization(msg) => Self::Internal(msg),
            dataplug_store::StoreError::Wallet(err) => Self::Internal(err.to_string()),
        }
    }
}
