//! Error types for gateway operations.

/// Errors that can occur talking to the payment gateway.
///
/// A definitive charge verdict (paid, still pending, failed) is never an
/// error: those arrive as [`crate::ChargeOutcome`]. Errors here mean the
/// question went unanswered.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// HTTP request failed (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway returned a non-success HTTP status.
    #[error("gateway API error: HTTP {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the gateway response body, if any.
        message: String,
    },

    /// The gateway answered 2xx but the response body was unusable.
    #[error("gateway response missing data: {0}")]
    MissingData(String),

    /// The client could not be constructed.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl GatewayError {
    /// Whether retrying the same call can plausibly succeed.
    ///
    /// Transport failures, 5xx responses and rate limits are retryable;
    /// 4xx responses are not (the request itself is wrong).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            Self::MissingData(_) | Self::Configuration(_) => false,
        }
    }
}
