//! Reconciliation engine integration tests.
//!
//! These cover the money-path properties: at-most-once crediting under
//! concurrency, replay safety, claim staleness, and the amount-mismatch
//! guard.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{
    charge_success_webhook, verify_pending_body, verify_success_body, TestHarness, PAYSTACK_SECRET,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use dataplug_core::DepositStatus;
use dataplug_gateway::GatewayClient;
use dataplug_service::{ReconcileOutcome, Reconciler, Trigger};
use dataplug_store::Store;

// ============================================================================
// Client verification
// ============================================================================

#[tokio::test]
async fn client_verify_credits_once_and_replays_from_snapshot() {
    let harness = TestHarness::new().await;
    let reference = harness.seed_deposit(5000, 5098);

    // The replay must be answered from the stored record, not the gateway
    Mock::given(method("GET"))
        .and(path(format!("/transaction/verify/{}", reference.as_str())))
        .respond_with(ResponseTemplate::new(200).set_body_json(verify_success_body(5098)))
        .expect(1)
        .mount(&harness.gateway)
        .await;

    let first = harness
        .server
        .post(&format!("/v1/deposits/{}/verify", reference.as_str()))
        .add_header("authorization", harness.user_auth_header())
        .await;
    first.assert_status_ok();
    let body: serde_json::Value = first.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["new_balance_pesewas"], 5000);

    let replay = harness
        .server
        .post(&format!("/v1/deposits/{}/verify", reference.as_str()))
        .add_header("authorization", harness.user_auth_header())
        .await;
    replay.assert_status_ok();
    let body: serde_json::Value = replay.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["new_balance_pesewas"], 5000);

    let wallet = harness
        .store
        .get_wallet(&harness.test_user_id)
        .unwrap()
        .unwrap();
    assert_eq!(wallet.balance_pesewas, 5000);
    assert_eq!(wallet.entries.len(), 1);
    assert!(wallet.verify_chain().is_ok());

    harness.gateway.verify().await;
}

#[tokio::test]
async fn client_polls_are_damped_while_charge_is_unsettled() {
    let harness = TestHarness::new().await;
    let reference = harness.seed_deposit(5000, 5098);

    Mock::given(method("GET"))
        .and(path(format!("/transaction/verify/{}", reference.as_str())))
        .respond_with(ResponseTemplate::new(200).set_body_json(verify_pending_body()))
        .expect(1)
        .mount(&harness.gateway)
        .await;

    for _ in 0..3 {
        let response = harness
            .server
            .post(&format!("/v1/deposits/{}/verify", reference.as_str()))
            .add_header("authorization", harness.user_auth_header())
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["status"], "pending");
    }

    harness.gateway.verify().await;
}

#[tokio::test]
async fn admin_verify_bypasses_pending_damping() {
    let harness = TestHarness::new().await;
    let reference = harness.seed_deposit(5000, 5098);

    Mock::given(method("GET"))
        .and(path(format!("/transaction/verify/{}", reference.as_str())))
        .respond_with(ResponseTemplate::new(200).set_body_json(verify_pending_body()))
        .expect(2)
        .mount(&harness.gateway)
        .await;

    // Client poll caches the pending observation
    harness
        .server
        .post(&format!("/v1/deposits/{}/verify", reference.as_str()))
        .add_header("authorization", harness.user_auth_header())
        .await
        .assert_status_ok();

    // The admin path must ask the gateway again
    let response = harness
        .server
        .post(&format!("/v1/admin/deposits/{}/verify", reference.as_str()))
        .add_header("x-admin-key", common::ADMIN_API_KEY)
        .await;
    response.assert_status_ok();

    harness.gateway.verify().await;
}

#[tokio::test]
async fn admin_verify_requires_admin_key() {
    let harness = TestHarness::new().await;
    let reference = harness.seed_deposit(5000, 5098);

    harness
        .server
        .post(&format!("/v1/admin/deposits/{}/verify", reference.as_str()))
        .await
        .assert_status_unauthorized();

    harness
        .server
        .post(&format!("/v1/admin/deposits/{}/verify", reference.as_str()))
        .add_header("x-admin-key", "wrong-key")
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn verify_unknown_reference_is_not_found() {
    let harness = TestHarness::new().await;
    let reference = dataplug_core::DepositReference::generate();

    let response = harness
        .server
        .post(&format!("/v1/deposits/{}/verify", reference.as_str()))
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn verify_foreign_deposit_is_not_found() {
    let harness = TestHarness::new().await;
    let reference = harness.seed_deposit(5000, 5098);

    let response = harness
        .server
        .post(&format!("/v1/deposits/{}/verify", reference.as_str()))
        .add_header("authorization", TestHarness::other_user_auth_header())
        .await;

    response.assert_status_not_found();
}

// ============================================================================
// Claim contention and staleness
// ============================================================================

#[tokio::test]
async fn verify_conflicts_while_a_live_claim_is_held() {
    let harness = TestHarness::new().await;
    let reference = harness.seed_deposit(5000, 5098);

    // Simulate another in-flight attempt holding the claim
    harness
        .store
        .claim_deposit(&reference, "wh-inflight", chrono::Duration::minutes(5))
        .unwrap();

    let response = harness
        .server
        .post(&format!("/v1/deposits/{}/verify", reference.as_str()))
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "conflict");
}

#[tokio::test]
async fn verify_takes_over_a_stale_claim() {
    // Zero staleness: any held claim counts as abandoned
    let harness = TestHarness::with_claim_stale_seconds(0).await;
    let reference = harness.seed_deposit(5000, 5098);
    harness
        .mock_verify(&reference, verify_success_body(5098))
        .await;

    // A crashed attempt left its claim behind
    harness
        .store
        .claim_deposit(&reference, "wh-crashed", chrono::Duration::minutes(5))
        .unwrap();

    let response = harness
        .server
        .post(&format!("/v1/deposits/{}/verify", reference.as_str()))
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);

    let stored = harness.store.get_deposit(&reference).unwrap().unwrap();
    assert_eq!(stored.status, DepositStatus::Completed);
    // The takeover stamped its own key over the crashed attempt's
    assert!(stored.idempotency_key.unwrap().starts_with("cv-"));
}

// ============================================================================
// Amount mismatch guard
// ============================================================================

#[tokio::test]
async fn out_of_tolerance_amount_blocks_credit_and_annotates() {
    let harness = TestHarness::new().await;
    let reference = harness.seed_deposit(5000, 5098);
    harness
        .mock_verify(&reference, verify_success_body(4000))
        .await;

    let response = harness
        .server
        .post(&format!("/v1/deposits/{}/verify", reference.as_str()))
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "amount_mismatch");
    assert_eq!(body["error"]["details"]["expected_pesewas"], 5098);
    assert_eq!(body["error"]["details"]["reported_pesewas"], 4000);

    // No credit; the deposit stays pending for review, claim released
    let stored = harness.store.get_deposit(&reference).unwrap().unwrap();
    assert_eq!(stored.status, DepositStatus::Pending);
    assert!(!stored.processing);
    assert!(stored.last_error.unwrap().contains("amount mismatch"));
    assert!(harness
        .store
        .get_wallet(&harness.test_user_id)
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn amount_within_tolerance_is_credited() {
    let harness = TestHarness::new().await;
    let reference = harness.seed_deposit(5000, 5098);
    // Off by exactly the tolerance bound
    harness
        .mock_verify(&reference, verify_success_body(5148))
        .await;

    let response = harness
        .server
        .post(&format!("/v1/deposits/{}/verify", reference.as_str()))
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let wallet = harness
        .store
        .get_wallet(&harness.test_user_id)
        .unwrap()
        .unwrap();
    // The credit is always the fee-exclusive deposit amount
    assert_eq!(wallet.balance_pesewas, 5000);
}

#[tokio::test]
async fn mismatched_deposit_can_still_settle_after_gateway_corrects() {
    let harness = TestHarness::new().await;
    let reference = harness.seed_deposit(5000, 5098);

    Mock::given(method("GET"))
        .and(path(format!("/transaction/verify/{}", reference.as_str())))
        .respond_with(ResponseTemplate::new(200).set_body_json(verify_success_body(100)))
        .up_to_n_times(1)
        .mount(&harness.gateway)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/transaction/verify/{}", reference.as_str())))
        .respond_with(ResponseTemplate::new(200).set_body_json(verify_success_body(5098)))
        .mount(&harness.gateway)
        .await;

    harness
        .server
        .post(&format!("/v1/deposits/{}/verify", reference.as_str()))
        .add_header("authorization", harness.user_auth_header())
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let retry = harness
        .server
        .post(&format!("/v1/deposits/{}/verify", reference.as_str()))
        .add_header("authorization", harness.user_auth_header())
        .await;
    retry.assert_status_ok();

    let stored = harness.store.get_deposit(&reference).unwrap().unwrap();
    assert_eq!(stored.status, DepositStatus::Completed);
}

// ============================================================================
// Concurrency properties
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn fifty_concurrent_attempts_credit_exactly_once() {
    let harness = TestHarness::new().await;
    let reference = harness.seed_deposit(5000, 5098);

    // Exactly one attempt may reach the gateway: the claim winner
    Mock::given(method("GET"))
        .and(path(format!("/transaction/verify/{}", reference.as_str())))
        .respond_with(ResponseTemplate::new(200).set_body_json(verify_success_body(5098)))
        .expect(1)
        .mount(&harness.gateway)
        .await;

    let gateway =
        Arc::new(GatewayClient::new(harness.gateway.uri(), PAYSTACK_SECRET).unwrap());
    let reconciler = Arc::new(Reconciler::new(
        Arc::clone(&harness.store),
        gateway,
        chrono::Duration::seconds(300),
    ));

    let mut tasks = Vec::new();
    for _ in 0..50 {
        let reconciler = Arc::clone(&reconciler);
        let reference = reference.clone();
        tasks.push(tokio::spawn(async move {
            reconciler.process(&reference, Trigger::ClientVerify).await
        }));
    }

    let mut credited = 0;
    let mut replayed = 0;
    let mut in_flight = 0;
    for result in futures::future::join_all(tasks).await {
        match result.expect("task panicked").expect("attempt failed") {
            ReconcileOutcome::Credited { .. } => credited += 1,
            ReconcileOutcome::AlreadyCompleted { .. } => replayed += 1,
            ReconcileOutcome::InFlight => in_flight += 1,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    assert_eq!(credited, 1, "exactly one attempt must credit");
    assert_eq!(replayed + in_flight, 49);

    let wallet = harness
        .store
        .get_wallet(&harness.test_user_id)
        .unwrap()
        .unwrap();
    assert_eq!(wallet.balance_pesewas, 5000);
    assert_eq!(wallet.entries.len(), 1);
    assert!(wallet.verify_chain().is_ok());

    harness.gateway.verify().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_webhook_deliveries_credit_once() {
    let harness = TestHarness::new().await;
    let reference = harness.seed_deposit(5000, 5098);
    harness
        .mock_verify(&reference, verify_success_body(5098))
        .await;

    let body = charge_success_webhook(&reference, 5098);
    let (first, second) = tokio::join!(harness.post_webhook(&body), harness.post_webhook(&body));

    // Both deliveries are acked no matter who won the claim
    first.assert_status_ok();
    second.assert_status_ok();

    let wallet = harness
        .store
        .get_wallet(&harness.test_user_id)
        .unwrap()
        .unwrap();
    assert_eq!(wallet.balance_pesewas, 5000);
    assert_eq!(wallet.entries.len(), 1);

    let stored = harness.store.get_deposit(&reference).unwrap().unwrap();
    assert_eq!(stored.status, DepositStatus::Completed);
    assert_eq!(stored.new_balance_pesewas, Some(5000));
}
