//! Integration tests for the client SDK against a mock dataplug API.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dataplug_client::{ClientError, ClientOptions, DataplugClient, InitiateDepositRequest};
use dataplug_core::DepositStatus;

const REFERENCE: &str = "DEP-a1b2c3d4-1700000000000";
const USER_JWT: &str = "header.payload.signature";
const ADMIN_KEY: &str = "ops-admin-key";

fn error_body(code: &str, message: &str, details: Option<serde_json::Value>) -> serde_json::Value {
    let mut error = json!({ "code": code, "message": message });
    if let Some(details) = details {
        error["details"] = details;
    }
    json!({ "error": error })
}

// =============================================================================
// Deposits
// =============================================================================

#[tokio::test]
async fn initiate_deposit_posts_bearer_and_maps_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/deposits"))
        .and(header("authorization", format!("Bearer {USER_JWT}")))
        .and(body_partial_json(json!({
            "amount_pesewas": 5000,
            "email": "customer@example.com"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reference": REFERENCE,
            "authorization_url": "https://checkout.paystack.com/0peioxfhpn",
            "access_code": "0peioxfhpn",
            "amount_pesewas": 5000,
            "fee_pesewas": 98,
            "charged_pesewas": 5098
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = DataplugClient::new(server.uri());
    let response = client
        .initiate_deposit(
            USER_JWT,
            &InitiateDepositRequest {
                amount_pesewas: 5000,
                email: "customer@example.com".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(response.reference, REFERENCE);
    assert_eq!(response.charged_pesewas, 5098);
    assert!(response.authorization_url.starts_with("https://"));
}

#[tokio::test]
async fn get_deposit_maps_typed_status_and_timestamps() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/deposits/{REFERENCE}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reference": REFERENCE,
            "amount_pesewas": 5000,
            "charged_pesewas": 5098,
            "status": "completed",
            "new_balance_pesewas": 5000,
            "channel": "mobile_money",
            "created_at": "2025-03-08T13:10:00+00:00",
            "paid_at": "2025-03-08T13:12:24+00:00",
            "completed_at": "2025-03-08T13:12:30+00:00"
        })))
        .mount(&server)
        .await;

    let client = DataplugClient::new(server.uri());
    let deposit = client.get_deposit(USER_JWT, REFERENCE).await.unwrap();

    assert_eq!(deposit.status, DepositStatus::Completed);
    assert_eq!(deposit.new_balance_pesewas, Some(5000));
    assert!(deposit.paid_at.unwrap() > deposit.created_at);
}

#[tokio::test]
async fn list_deposits_sends_pagination_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/deposits"))
        .and(query_param("limit", "5"))
        .and(query_param("offset", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deposits": [],
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = DataplugClient::new(server.uri());
    let page = client.list_deposits(USER_JWT, 5, 10).await.unwrap();

    assert!(page.deposits.is_empty());
    assert!(!page.has_more);
}

// =============================================================================
// Verification
// =============================================================================

#[tokio::test]
async fn verify_deposit_maps_credited_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/deposits/{REFERENCE}/verify")))
        .and(header("authorization", format!("Bearer {USER_JWT}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "status": "completed",
            "new_balance_pesewas": 5000
        })))
        .mount(&server)
        .await;

    let client = DataplugClient::new(server.uri());
    let verdict = client.verify_deposit(USER_JWT, REFERENCE).await.unwrap();

    assert!(verdict.success);
    assert_eq!(verdict.status, "completed");
    assert_eq!(verdict.new_balance_pesewas, Some(5000));
}

#[tokio::test]
async fn amount_mismatch_maps_to_typed_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/deposits/{REFERENCE}/verify")))
        .respond_with(ResponseTemplate::new(422).set_body_json(error_body(
            "amount_mismatch",
            "amount mismatch: expected 5098, gateway reported 4000",
            Some(json!({ "expected_pesewas": 5098, "reported_pesewas": 4000 })),
        )))
        .mount(&server)
        .await;

    let client = DataplugClient::new(server.uri());
    let error = client.verify_deposit(USER_JWT, REFERENCE).await.unwrap_err();

    match error {
        ClientError::AmountMismatch {
            expected_pesewas,
            reported_pesewas,
        } => {
            assert_eq!(expected_pesewas, 5098);
            assert_eq!(reported_pesewas, 4000);
        }
        other => panic!("expected AmountMismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn conflict_maps_to_verification_in_flight() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/deposits/{REFERENCE}/verify")))
        .respond_with(ResponseTemplate::new(409).set_body_json(error_body(
            "conflict",
            "Verification already in progress, retry shortly",
            None,
        )))
        .mount(&server)
        .await;

    let client = DataplugClient::new(server.uri());
    let error = client.verify_deposit(USER_JWT, REFERENCE).await.unwrap_err();

    assert!(matches!(error, ClientError::VerificationInFlight { .. }));
}

#[tokio::test]
async fn not_found_maps_to_typed_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/deposits/{REFERENCE}/verify")))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(error_body("not_found", "Deposit not found", None)),
        )
        .mount(&server)
        .await;

    let client = DataplugClient::new(server.uri());
    let error = client.verify_deposit(USER_JWT, REFERENCE).await.unwrap_err();

    assert!(matches!(error, ClientError::NotFound { .. }));
}

#[tokio::test]
async fn unparseable_error_body_falls_back_to_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/deposits/{REFERENCE}/verify")))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream blew up"))
        .mount(&server)
        .await;

    let client = DataplugClient::new(server.uri());
    let error = client.verify_deposit(USER_JWT, REFERENCE).await.unwrap_err();

    match error {
        ClientError::Api { code, status, .. } => {
            assert_eq!(code, "unknown");
            assert_eq!(status, 500);
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

// =============================================================================
// Wallet
// =============================================================================

#[tokio::test]
async fn get_wallet_maps_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/wallet"))
        .and(header("authorization", format!("Bearer {USER_JWT}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "balance_pesewas": 5098,
            "balance_formatted": "GHS 50.98",
            "lifetime_credited_pesewas": 5098,
            "lifetime_debited_pesewas": 0
        })))
        .mount(&server)
        .await;

    let client = DataplugClient::new(server.uri());
    let wallet = client.get_wallet(USER_JWT).await.unwrap();

    assert_eq!(wallet.balance_pesewas, 5098);
    assert_eq!(wallet.balance_formatted, "GHS 50.98");
}

#[tokio::test]
async fn list_ledger_maps_entries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/wallet/ledger"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [{
                "id": "01JAAAAAAAAAAAAAAAAAAAAAAA",
                "entry_type": "deposit",
                "amount_pesewas": 5000,
                "balance_before_pesewas": 0,
                "balance_after_pesewas": 5000,
                "reference": REFERENCE,
                "description": "Deposit via mobile_money",
                "created_at": "2025-03-08T13:12:30+00:00"
            }],
            "has_more": false
        })))
        .mount(&server)
        .await;

    let client = DataplugClient::new(server.uri());
    let page = client.list_ledger(USER_JWT, 50, 0).await.unwrap();

    assert_eq!(page.entries.len(), 1);
    assert_eq!(page.entries[0].entry_type, "deposit");
    assert_eq!(page.entries[0].balance_after_pesewas, 5000);
}

// =============================================================================
// Admin
// =============================================================================

#[tokio::test]
async fn admin_verify_sends_admin_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/admin/deposits/{REFERENCE}/verify")))
        .and(header("x-admin-key", ADMIN_KEY))
        .and(header("x-admin-id", "support-desk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "status": "pending",
            "new_balance_pesewas": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let options = ClientOptions {
        admin_key: Some(ADMIN_KEY.to_string()),
        admin_id: "support-desk".to_string(),
        ..ClientOptions::default()
    };
    let client = DataplugClient::with_options(server.uri(), options);
    let verdict = client.admin_verify_deposit(REFERENCE).await.unwrap();

    assert!(!verdict.success);
    assert_eq!(verdict.status, "pending");
}

#[tokio::test]
async fn admin_verify_without_key_is_a_configuration_error() {
    let client = DataplugClient::new("http://localhost:9");
    let error = client.admin_verify_deposit(REFERENCE).await.unwrap_err();

    assert!(matches!(error, ClientError::Configuration(_)));
}
