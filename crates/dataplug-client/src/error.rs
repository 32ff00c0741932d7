//! Client error types.

/// Errors that can occur when using the dataplug client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// The settled amount did not match the charged amount.
    #[error("amount mismatch: expected {expected_pesewas}, gateway reported {reported_pesewas}")]
    AmountMismatch {
        /// Amount the deposit was charged, in pesewas.
        expected_pesewas: i64,
        /// Amount the gateway reported as settled, in pesewas.
        reported_pesewas: i64,
    },

    /// Another verification attempt holds the deposit right now.
    #[error("verification in flight: {message}")]
    VerificationInFlight {
        /// Server-provided detail.
        message: String,
    },

    /// Deposit not found (or not owned by the authenticated user).
    #[error("not found: {message}")]
    NotFound {
        /// Server-provided detail.
        message: String,
    },

    /// The payment gateway could not be reached; the attempt may be retried.
    #[error("gateway unavailable: {message}")]
    GatewayUnavailable {
        /// Server-provided detail.
        message: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
