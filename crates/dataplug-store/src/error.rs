//! Error types for DataPlug storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("not found")]
    NotFound,

    /// A deposit with this reference already exists.
    #[error("duplicate deposit reference: {reference}")]
    DuplicateReference {
        /// The colliding reference.
        reference: String,
    },

    /// The operation requires a live claim on the deposit.
    #[error("deposit {reference} is not claimed for processing")]
    NotClaimed {
        /// The unclaimed reference.
        reference: String,
    },

    /// The claim on the deposit is held by a different attempt.
    #[error("claim on deposit {reference} is held by another attempt")]
    ClaimMismatch {
        /// The contested reference.
        reference: String,
    },

    /// A wallet invariant was violated while applying a change.
    #[error(transparent)]
    Wallet(#[from] dataplug_core::WalletError),
}
