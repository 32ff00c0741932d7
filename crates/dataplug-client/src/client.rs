//! Dataplug HTTP client implementation.

use reqwest::Client;
use std::time::Duration;

use crate::error::ClientError;
use crate::types::{
    ApiErrorResponse, DepositListResponse, DepositRecord, HealthResponse, InitiateDepositRequest,
    InitiateDepositResponse, LedgerResponse, VerifyDepositResponse, WalletResponse,
};

/// Dataplug API client.
///
/// User-facing methods take the caller's storefront JWT per call; tokens
/// are short-lived, so the client never stores one. Admin methods use the
/// admin key configured via [`ClientOptions`].
#[derive(Debug, Clone)]
pub struct DataplugClient {
    client: Client,
    base_url: String,
    admin_key: Option<String>,
    admin_id: String,
}

impl DataplugClient {
    /// Create a new dataplug client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the dataplug service (e.g., `"http://dataplug:8080"`)
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Create a new dataplug client with custom options.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with default settings).
    #[must_use]
    pub fn with_options(base_url: impl Into<String>, options: ClientOptions) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            admin_key: options.admin_key,
            admin_id: options.admin_id,
        }
    }

    /// Start a deposit and get the hosted checkout URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn initiate_deposit(
        &self,
        user_jwt: &str,
        request: &InitiateDepositRequest,
    ) -> Result<InitiateDepositResponse, ClientError> {
        let url = format!("{}/v1/deposits", self.base_url);

        tracing::debug!(
            amount_pesewas = request.amount_pesewas,
            "initiating deposit"
        );

        let response = self
            .client
            .post(&url)
            .header("authorization", format!("Bearer {user_jwt}"))
            .json(request)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Ask the service to verify a deposit against the gateway.
    ///
    /// Safe to call repeatedly; a deposit that has already been credited
    /// answers from its stored record without touching the wallet again.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn verify_deposit(
        &self,
        user_jwt: &str,
        reference: &str,
    ) -> Result<VerifyDepositResponse, ClientError> {
        let url = format!("{}/v1/deposits/{reference}/verify", self.base_url);

        tracing::debug!(reference = %reference, "verifying deposit");

        let response = self
            .client
            .post(&url)
            .header("authorization", format!("Bearer {user_jwt}"))
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Fetch a single deposit record.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn get_deposit(
        &self,
        user_jwt: &str,
        reference: &str,
    ) -> Result<DepositRecord, ClientError> {
        let url = format!("{}/v1/deposits/{reference}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("authorization", format!("Bearer {user_jwt}"))
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// List the caller's deposits, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_deposits(
        &self,
        user_jwt: &str,
        limit: usize,
        offset: usize,
    ) -> Result<DepositListResponse, ClientError> {
        let url = format!("{}/v1/deposits", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("authorization", format!("Bearer {user_jwt}"))
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Fetch the caller's wallet balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn get_wallet(&self, user_jwt: &str) -> Result<WalletResponse, ClientError> {
        let url = format!("{}/v1/wallet", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("authorization", format!("Bearer {user_jwt}"))
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// List the caller's wallet ledger entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_ledger(
        &self,
        user_jwt: &str,
        limit: usize,
        offset: usize,
    ) -> Result<LedgerResponse, ClientError> {
        let url = format!("{}/v1/wallet/ledger", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("authorization", format!("Bearer {user_jwt}"))
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Force a verification as an operator, regardless of who owns the
    /// deposit.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if no admin key was
    /// configured, or an error if the request fails.
    pub async fn admin_verify_deposit(
        &self,
        reference: &str,
    ) -> Result<VerifyDepositResponse, ClientError> {
        let admin_key = self
            .admin_key
            .as_ref()
            .ok_or_else(|| ClientError::Configuration("admin key not configured".to_string()))?;
        let url = format!("{}/v1/admin/deposits/{reference}/verify", self.base_url);

        tracing::debug!(reference = %reference, "admin verifying deposit");

        let response = self
            .client
            .post(&url)
            .header("x-admin-key", admin_key)
            .header("x-admin-id", &self.admin_id)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Check service health.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = format!("{}/health", self.base_url);

        let response = self.client.get(&url).send().await?;

        Self::handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Try to parse error response
        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => {
                let code = api_error.error.code.as_str();
                let message = api_error.error.message;

                // Map specific error codes to typed errors
                match code {
                    "amount_mismatch" => {
                        let expected_pesewas = api_error
                            .error
                            .details
                            .as_ref()
                            .and_then(|d| d.get("expected_pesewas"))
                            .and_then(serde_json::Value::as_i64)
                            .unwrap_or(0);
                        let reported_pesewas = api_error
                            .error
                            .details
                            .as_ref()
                            .and_then(|d| d.get("reported_pesewas"))
                            .and_then(serde_json::Value::as_i64)
                            .unwrap_or(0);

                        Err(ClientError::AmountMismatch {
                            expected_pesewas,
                            reported_pesewas,
                        })
                    }
                    "conflict" => Err(ClientError::VerificationInFlight { message }),
                    "not_found" => Err(ClientError::NotFound { message }),
                    "gateway_error" => Err(ClientError::GatewayUnavailable { message }),
                    _ => Err(ClientError::Api {
                        code: code.to_string(),
                        message,
                        status: status.as_u16(),
                    }),
                }
            }
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
    /// Admin key for operator endpoints.
    pub admin_key: Option<String>,
    /// Operator identity recorded in audit logs (default: `admin`).
    pub admin_id: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            admin_key: None,
            admin_id: "admin".to_string(),
        }
    }
}

impl ClientOptions {
    /// Create options with an admin key.
    #[must_use]
    pub fn with_admin_key(key: impl Into<String>) -> Self {
        Self {
            admin_key: Some(key.into()),
            ..Self::default()
        }
    }
}
