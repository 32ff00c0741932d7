//! Common test utilities for dataplug integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dataplug_core::{DepositReference, DepositTransaction, UserId};
use dataplug_service::{create_router, crypto, AppState, ServiceConfig};
use dataplug_store::{RocksStore, Store};

/// Paystack secret used by the harness; also keys webhook signatures.
pub const PAYSTACK_SECRET: &str = "sk_test_harness_secret";

/// Shared secret for minting storefront JWTs.
pub const JWT_SECRET: &str = "test-jwt-secret";

/// Admin API key configured on the harness.
pub const ADMIN_API_KEY: &str = "test-admin-key";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// Mock Paystack API the service verifies against.
    pub gateway: MockServer,
    /// Direct handle on the store for seeding and assertions.
    pub store: Arc<RocksStore>,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
}

impl TestHarness {
    /// Create a new test harness with a fresh database and mock gateway.
    pub async fn new() -> Self {
        Self::with_claim_stale_seconds(300).await
    }

    /// Create a harness with an explicit claim staleness threshold.
    ///
    /// Zero makes every held claim immediately reclaimable, which is how
    /// the takeover tests simulate a crashed attempt.
    pub async fn with_claim_stale_seconds(claim_stale_seconds: i64) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store =
            Arc::new(RocksStore::open(temp_dir.path()).expect("Failed to open store"));
        let gateway = MockServer::start().await;

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            jwt_secret: Some(JWT_SECRET.into()),
            jwt_audience: "dataplug".into(),
            admin_api_key: Some(ADMIN_API_KEY.into()),
            paystack_secret_key: Some(PAYSTACK_SECRET.into()),
            paystack_base_url: gateway.uri(),
            claim_stale_seconds,
            ..ServiceConfig::default()
        };

        let state = AppState::new(Arc::clone(&store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        let test_user_id = UserId::generate();

        Self {
            server,
            _temp_dir: temp_dir,
            gateway,
            store,
            test_user_id,
        }
    }

    /// Get the authorization header for user authentication.
    pub fn user_auth_header(&self) -> String {
        format!("Bearer {}", mint_token(&self.test_user_id))
    }

    /// Get a different user's auth header (for testing isolation).
    pub fn other_user_auth_header() -> String {
        let other_user = UserId::generate();
        format!("Bearer {}", mint_token(&other_user))
    }

    /// Seed a Pending deposit for the test user and return its reference.
    pub fn seed_deposit(&self, amount_pesewas: i64, charged_pesewas: i64) -> DepositReference {
        let reference = DepositReference::generate();
        let deposit = DepositTransaction::pending(
            reference.clone(),
            self.test_user_id,
            amount_pesewas,
            charged_pesewas,
        );
        self.store
            .create_deposit(&deposit)
            .expect("Failed to seed deposit");
        reference
    }

    /// Mount a gateway verify mock answering with the given body.
    pub async fn mock_verify(&self, reference: &DepositReference, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/transaction/verify/{}", reference.as_str())))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.gateway)
            .await;
    }

    /// Sign a webhook body the way Paystack does.
    pub fn sign_webhook(&self, body: &str) -> String {
        crypto::hmac_sha512_hex(PAYSTACK_SECRET, body)
    }

    /// POST a webhook body with a valid signature.
    pub async fn post_webhook(&self, body: &str) -> axum_test::TestResponse {
        self.server
            .post("/webhooks/paystack")
            .add_header("x-paystack-signature", self.sign_webhook(body))
            .text(body.to_string())
            .await
    }
}

/// Mint a storefront HS256 JWT for a user.
pub fn mint_token(user_id: &UserId) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = json!({
        "sub": user_id.to_string(),
        "aud": "dataplug",
        "exp": now + 3600,
        "iat": now,
    });

    jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to mint test token")
}

/// Successful gateway verify body for a settled charge.
pub fn verify_success_body(amount_pesewas: i64) -> serde_json::Value {
    json!({
        "status": true,
        "message": "Verification successful",
        "data": {
            "id": 4_099_260_516_u64,
            "status": "success",
            "amount": amount_pesewas,
            "channel": "mobile_money",
            "paid_at": "2025-03-08T13:12:24Z"
        }
    })
}

/// Gateway verify body for a charge the customer has not paid yet.
pub fn verify_pending_body() -> serde_json::Value {
    json!({
        "status": true,
        "message": "Verification successful",
        "data": {
            "status": "abandoned",
            "amount": 0
        }
    })
}

/// Gateway verify body for a failed charge.
pub fn verify_failed_body(amount_pesewas: i64) -> serde_json::Value {
    json!({
        "status": true,
        "message": "Verification successful",
        "data": {
            "status": "failed",
            "amount": amount_pesewas
        }
    })
}

/// A signed-payload-ready charge.success webhook body.
pub fn charge_success_webhook(reference: &DepositReference, amount_pesewas: i64) -> String {
    json!({
        "event": "charge.success",
        "data": {
            "reference": reference.as_str(),
            "amount": amount_pesewas,
            "status": "success",
            "channel": "mobile_money"
        }
    })
    .to_string()
}
