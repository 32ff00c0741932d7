//! Wallet balance and ledger integration tests.

mod common;

use common::{verify_success_body, TestHarness};

// ============================================================================
// Balance
// ============================================================================

#[tokio::test]
async fn wallet_reads_as_zero_before_first_credit() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get("/v1/wallet")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance_pesewas"], 0);
    assert_eq!(body["balance_formatted"], "GHS 0.00");
    assert_eq!(body["lifetime_credited_pesewas"], 0);
}

#[tokio::test]
async fn wallet_without_auth_fails() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/v1/wallet").await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn wallet_reflects_credited_deposit() {
    let harness = TestHarness::new().await;
    let reference = harness.seed_deposit(5000, 5098);
    harness
        .mock_verify(&reference, verify_success_body(5098))
        .await;

    harness
        .server
        .post(&format!("/v1/deposits/{}/verify", reference.as_str()))
        .add_header("authorization", harness.user_auth_header())
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get("/v1/wallet")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance_pesewas"], 5000);
    assert_eq!(body["balance_formatted"], "GHS 50.00");
    assert_eq!(body["lifetime_credited_pesewas"], 5000);
}

// ============================================================================
// Ledger
// ============================================================================

#[tokio::test]
async fn ledger_empty_before_first_credit() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get("/v1/wallet/ledger")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["entries"].as_array().unwrap().is_empty());
    assert_eq!(body["has_more"], false);
}

#[tokio::test]
async fn ledger_lists_deposit_entries_newest_first() {
    let harness = TestHarness::new().await;

    let first = harness.seed_deposit(2000, 2039);
    harness.mock_verify(&first, verify_success_body(2039)).await;
    harness
        .server
        .post(&format!("/v1/deposits/{}/verify", first.as_str()))
        .add_header("authorization", harness.user_auth_header())
        .await
        .assert_status_ok();

    let second = harness.seed_deposit(3000, 3059);
    harness
        .mock_verify(&second, verify_success_body(3059))
        .await;
    harness
        .server
        .post(&format!("/v1/deposits/{}/verify", second.as_str()))
        .add_header("authorization", harness.user_auth_header())
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get("/v1/wallet/ledger")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);

    // Newest first: the second deposit tops the list
    assert_eq!(entries[0]["reference"], second.as_str());
    assert_eq!(entries[0]["amount_pesewas"], 3000);
    assert_eq!(entries[0]["balance_before_pesewas"], 2000);
    assert_eq!(entries[0]["balance_after_pesewas"], 5000);
    assert_eq!(entries[0]["entry_type"], "deposit");

    assert_eq!(entries[1]["reference"], first.as_str());
    assert_eq!(entries[1]["balance_before_pesewas"], 0);
    assert_eq!(entries[1]["balance_after_pesewas"], 2000);
}

#[tokio::test]
async fn ledger_pagination() {
    let harness = TestHarness::new().await;

    for amount in [1000_i64, 2000, 3000] {
        let reference = harness.seed_deposit(amount, amount + 20);
        harness
            .mock_verify(&reference, verify_success_body(amount + 20))
            .await;
        harness
            .server
            .post(&format!("/v1/deposits/{}/verify", reference.as_str()))
            .add_header("authorization", harness.user_auth_header())
            .await
            .assert_status_ok();
    }

    let response = harness
        .server
        .get("/v1/wallet/ledger?limit=2")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["entries"].as_array().unwrap().len(), 2);
    assert_eq!(body["has_more"], true);

    let response = harness
        .server
        .get("/v1/wallet/ledger?limit=2&offset=2")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(body["has_more"], false);
    assert_eq!(entries[0]["amount_pesewas"], 1000);
}
