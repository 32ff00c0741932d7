//! Gateway API client implementation.

use std::time::Duration;

use reqwest::Client;

use crate::error::GatewayError;
use crate::retry::RetryPolicy;
use crate::types::{
    ChargeOutcome, Envelope, InitializeRequest, InitializedCharge, VerifiedCharge, VerifyData,
};

/// Paystack API client.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl GatewayClient {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a new gateway client with the default timeout.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Gateway API base URL (`https://api.paystack.co`)
    /// * `secret_key` - Gateway secret key (`sk_test_...` or `sk_live_...`)
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Configuration` if the HTTP client cannot be
    /// built.
    pub fn new(
        base_url: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        Self::with_timeout(base_url, secret_key, Self::DEFAULT_TIMEOUT)
    }

    /// Create a new gateway client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Configuration` if the HTTP client cannot be
    /// built.
    pub fn with_timeout(
        base_url: impl Into<String>,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        })
    }

    /// Initialize a hosted-checkout transaction.
    ///
    /// The returned `authorization_url` is where the customer pays; the
    /// deposit reference inside `request` ties the eventual webhook back
    /// to our record.
    ///
    /// # Errors
    ///
    /// Returns a `GatewayError` if the call fails or the gateway rejects
    /// the request.
    pub async fn initialize(
        &self,
        request: &InitializeRequest,
    ) -> Result<InitializedCharge, GatewayError> {
        tracing::debug!(
            reference = %request.reference,
            amount_pesewas = request.amount_pesewas,
            "initializing gateway transaction"
        );

        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Verify a charge by reference, retrying transient failures.
    ///
    /// A definitive gateway verdict (including "not paid yet" and
    /// "failed") returns `Ok`; only an unanswered question is an `Err`.
    /// Each retryable failure sleeps per the policy before the next
    /// attempt.
    ///
    /// # Errors
    ///
    /// Returns the last `GatewayError` once the attempt budget is spent,
    /// or immediately for non-retryable errors.
    pub async fn verify(
        &self,
        reference: &str,
        retry: &RetryPolicy,
    ) -> Result<VerifiedCharge, GatewayError> {
        let mut attempt = 0_u32;
        loop {
            attempt += 1;
            match self.verify_once(reference).await {
                Ok(charge) => {
                    tracing::debug!(
                        reference = %reference,
                        outcome = ?charge.outcome,
                        gateway_status = %charge.gateway_status,
                        amount_pesewas = charge.amount_pesewas,
                        "gateway verification answered"
                    );
                    return Ok(charge);
                }
                Err(e) if e.is_retryable() && attempt < retry.max_attempts => {
                    let delay = retry.delay_for(attempt);
                    tracing::warn!(
                        reference = %reference,
                        attempt,
                        max_attempts = retry.max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "gateway verification failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Single verification attempt.
    async fn verify_once(&self, reference: &str) -> Result<VerifiedCharge, GatewayError> {
        let response = self
            .client
            .get(format!("{}/transaction/verify/{reference}", self.base_url))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        let data: VerifyData = self.handle_response(response).await?;

        Ok(VerifiedCharge {
            outcome: ChargeOutcome::from_status(&data.status),
            amount_pesewas: data.amount,
            paid_at: data.paid_at,
            channel: data.channel,
            gateway_reference: data.id.map(|id| id.to_string()),
            gateway_status: data.status,
        })
    }

    /// Handle an API response and unwrap the envelope.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<Envelope<serde_json::Value>>()
                .await
                .map(|envelope| envelope.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));

            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> = response.json().await?;

        if !envelope.status {
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: envelope.message,
            });
        }

        envelope
            .data
            .ok_or(GatewayError::MissingData(envelope.message))
    }
}
