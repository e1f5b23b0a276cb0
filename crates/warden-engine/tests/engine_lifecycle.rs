//! End-to-end request lifecycle scenarios against mock collaborators

use std::time::Duration;

use alloy_primitives::Address;
use assert_matches::assert_matches;

use warden_core::{Amount, AssetId, AssetKind, ComparisonOperator, RequestPayload, Transfer, UserRole};
use warden_engine::{
    resubmit_with_approval, submit, Clock, EngineError, JobQueue, PolicyProvider, RequestStatus,
    RequestStore, WorkerPool,
};
use warden_policy::{Decision, PolicyEffect};
use warden_testkit::{
    amount_gate, approval, approval_quorum, authorization_request, erc20_transfer_payload,
    fresh_nonce_gate, native_transfer_payload, spending_cap, SnapshotBuilder, TestHarness,
};

const ONE_TOKEN: &str = "1000000000000000000";
const HALF_TOKEN: &str = "500000000000000000";

fn small_transfer() -> RequestPayload {
    native_transfer_payload(
        137,
        Address::repeat_byte(0x01),
        Address::repeat_byte(0x02),
        Amount::parse(HALF_TOKEN).unwrap(),
    )
}

#[tokio::test]
async fn permitted_transfer_records_a_signed_evaluation() {
    let harness = TestHarness::new();
    let (builder, alice) = SnapshotBuilder::new().user(UserRole::Member, "alice-key");
    let (builder, wallet) = builder.wallet(Address::repeat_byte(0x01), Some(alice));
    harness.directory.set_snapshot(builder.build());
    harness.policies.set_policies(vec![amount_gate(
        PolicyEffect::Permit,
        ComparisonOperator::Lte,
        Amount::parse(ONE_TOKEN).unwrap(),
    )]);

    let request = authorization_request(
        harness.org_id,
        alice,
        wallet,
        small_transfer(),
        "n-1",
    );
    let stored = submit(harness.store.as_ref(), harness.queue.as_ref(), request)
        .await
        .unwrap();

    let processed = harness.node.process(stored.id).await.unwrap();
    assert_eq!(processed.status, RequestStatus::Permitted);
    assert_eq!(processed.evaluations.len(), 1);
    let evaluation = &processed.evaluations[0];
    assert_eq!(evaluation.node_id, harness.node.node_id());
    assert_eq!(evaluation.response.decision, Decision::Permit);
    assert!(!evaluation.response.signature.sig.is_empty());
}

#[tokio::test]
async fn quorum_confirms_then_permits_after_resubmission() {
    let harness = TestHarness::new();
    let (builder, alice) = SnapshotBuilder::new().user(UserRole::Member, "alice-key");
    let (builder, bob) = builder.user(UserRole::Member, "bob-key");
    let (builder, carol) = builder.user(UserRole::Member, "carol-key");
    let (builder, wallet) = builder.wallet(Address::repeat_byte(0x01), Some(alice));
    harness.directory.set_snapshot(builder.build());
    harness
        .policies
        .set_policies(vec![approval_quorum(2, vec![bob, carol])]);

    let mut request = authorization_request(
        harness.org_id,
        alice,
        wallet,
        small_transfer(),
        "n-1",
    );
    request.add_approval(approval("bob-key"), harness.clock.now());
    let stored = submit(harness.store.as_ref(), harness.queue.as_ref(), request)
        .await
        .unwrap();

    let confirmed = harness.node.process(stored.id).await.unwrap();
    assert_eq!(confirmed.status, RequestStatus::Confirmed);
    assert_eq!(confirmed.evaluations[0].response.decision, Decision::Confirm);
    assert_eq!(
        confirmed.evaluations[0].response.reasons[0].approvals_missing,
        vec![carol]
    );
    harness.queue.complete(stored.id).await;

    resubmit_with_approval(
        harness.store.as_ref(),
        harness.queue.as_ref(),
        stored.id,
        approval("carol-key"),
        harness.clock.now(),
    )
    .await
    .unwrap();

    let permitted = harness.node.process(stored.id).await.unwrap();
    assert_eq!(permitted.status, RequestStatus::Permitted);
    assert_eq!(permitted.evaluations.len(), 2);
}

#[tokio::test]
async fn tampered_payload_fails_terminally() {
    let harness = TestHarness::new();
    let (builder, alice) = SnapshotBuilder::new().user(UserRole::Member, "alice-key");
    let (builder, wallet) = builder.wallet(Address::repeat_byte(0x01), Some(alice));
    harness.directory.set_snapshot(builder.build());

    let mut request = authorization_request(
        harness.org_id,
        alice,
        wallet,
        small_transfer(),
        "n-1",
    );
    request.payload = RequestPayload::SignMessage {
        message: "swapped after hashing".to_string(),
    };
    let stored = harness.store.create(request).await.unwrap();

    assert_matches!(
        harness.node.process(stored.id).await,
        Err(EngineError::Integrity { .. })
    );
    let stored = harness.store.find_by_id(stored.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Failed);
    assert!(stored.failure_reason.unwrap().contains("integrity"));
}

#[tokio::test]
async fn in_flight_request_rejects_a_second_dispatch() {
    let harness = TestHarness::new();
    let (builder, alice) = SnapshotBuilder::new().user(UserRole::Member, "alice-key");
    let (builder, wallet) = builder.wallet(Address::repeat_byte(0x01), Some(alice));
    harness.directory.set_snapshot(builder.build());

    let mut request = authorization_request(
        harness.org_id,
        alice,
        wallet,
        small_transfer(),
        "n-1",
    );
    request
        .transition(RequestStatus::Processing, harness.clock.now())
        .unwrap();
    let stored = harness.store.create(request).await.unwrap();

    assert_matches!(
        harness.node.process(stored.id).await,
        Err(EngineError::AlreadyProcessing { request_id }) if request_id == stored.id
    );
}

#[tokio::test]
async fn replayed_nonce_is_forbidden() {
    let harness = TestHarness::new();
    let (builder, alice) = SnapshotBuilder::new().user(UserRole::Member, "alice-key");
    let (builder, wallet) = builder.wallet(Address::repeat_byte(0x01), Some(alice));
    harness.directory.set_snapshot(builder.build());
    harness.policies.set_policies(vec![fresh_nonce_gate()]);

    let first = authorization_request(
        harness.org_id,
        alice,
        wallet,
        small_transfer(),
        "n-1",
    );
    let first = submit(harness.store.as_ref(), harness.queue.as_ref(), first)
        .await
        .unwrap();
    let first = harness.node.process(first.id).await.unwrap();
    assert_eq!(first.status, RequestStatus::Permitted);
    harness.queue.complete(first.id).await;

    // Same wallet, same nonce: the nonce is consumed, default deny applies.
    let replay = authorization_request(
        harness.org_id,
        alice,
        wallet,
        small_transfer(),
        "n-1",
    );
    let replay = submit(harness.store.as_ref(), harness.queue.as_ref(), replay)
        .await
        .unwrap();
    let replay = harness.node.process(replay.id).await.unwrap();
    assert_eq!(replay.status, RequestStatus::Forbidden);
}

#[tokio::test]
async fn transient_collaborator_failure_rolls_back_then_succeeds() {
    let harness = TestHarness::new();
    let (builder, alice) = SnapshotBuilder::new().user(UserRole::Member, "alice-key");
    let (builder, wallet) = builder.wallet(Address::repeat_byte(0x01), Some(alice));
    harness.directory.set_snapshot(builder.build());
    harness.policies.set_policies(vec![amount_gate(
        PolicyEffect::Permit,
        ComparisonOperator::Lte,
        Amount::parse(ONE_TOKEN).unwrap(),
    )]);
    harness.transfers.fail_transiently(1);

    let request = authorization_request(
        harness.org_id,
        alice,
        wallet,
        small_transfer(),
        "n-1",
    );
    let stored = submit(harness.store.as_ref(), harness.queue.as_ref(), request)
        .await
        .unwrap();

    let error = harness.node.process(stored.id).await.unwrap_err();
    assert!(error.is_transient());
    let rolled_back = harness.store.find_by_id(stored.id).await.unwrap().unwrap();
    assert_eq!(rolled_back.status, RequestStatus::Created);

    let permitted = harness.node.process(stored.id).await.unwrap();
    assert_eq!(permitted.status, RequestStatus::Permitted);
}

#[tokio::test]
async fn stalled_feed_times_out_as_transient_and_rolls_back() {
    let harness = TestHarness::new();
    let (builder, alice) = SnapshotBuilder::new().user(UserRole::Member, "alice-key");
    let (builder, wallet) = builder.wallet(Address::repeat_byte(0x01), Some(alice));
    harness.directory.set_snapshot(builder.build());
    harness.policies.set_policies(vec![amount_gate(
        PolicyEffect::Permit,
        ComparisonOperator::Lte,
        Amount::parse(ONE_TOKEN).unwrap(),
    )]);
    // Well past the harness's 200ms collaborator timeout.
    harness.transfers.stall_for(Duration::from_millis(500));

    let request = authorization_request(
        harness.org_id,
        alice,
        wallet,
        small_transfer(),
        "n-1",
    );
    let stored = submit(harness.store.as_ref(), harness.queue.as_ref(), request)
        .await
        .unwrap();

    let error = harness.node.process(stored.id).await.unwrap_err();
    assert!(error.is_transient());
    let rolled_back = harness.store.find_by_id(stored.id).await.unwrap().unwrap();
    assert_eq!(rolled_back.status, RequestStatus::Created);
}

#[tokio::test]
async fn spending_cap_forbids_until_the_window_rolls_past() {
    let harness = TestHarness::new();
    let (builder, alice) = SnapshotBuilder::new().user(UserRole::Member, "alice-key");
    let (builder, wallet) = builder.wallet(Address::repeat_byte(0x01), Some(alice));
    harness.directory.set_snapshot(builder.build());
    harness.policies.set_policies(vec![
        spending_cap(Amount::parse(ONE_TOKEN).unwrap(), 43_200),
        amount_gate(
            PolicyEffect::Permit,
            ComparisonOperator::Lte,
            Amount::parse(ONE_TOKEN).unwrap(),
        ),
    ]);

    // 0.9 tokens already spent from this wallet inside the 12h window.
    let token = Address::repeat_byte(0xaa);
    harness.transfers.push(Transfer {
        org_id: harness.org_id,
        wallet_id: wallet,
        from: Address::repeat_byte(0x01),
        to: Address::repeat_byte(0x02),
        token: AssetId::token(137, AssetKind::Erc20, token),
        amount: Amount::parse("900000000000000000").unwrap(),
        initiated_by: alice,
        created_at: harness.clock.now() - chrono::Duration::seconds(100),
    });

    let payload = erc20_transfer_payload(
        137,
        Address::repeat_byte(0x01),
        token,
        Address::repeat_byte(0x02),
        Amount::parse("200000000000000000").unwrap().0,
    );
    let over = authorization_request(harness.org_id, alice, wallet, payload.clone(), "n-1");
    let over = submit(harness.store.as_ref(), harness.queue.as_ref(), over)
        .await
        .unwrap();
    let over = harness.node.process(over.id).await.unwrap();
    assert_eq!(over.status, RequestStatus::Forbidden);
    harness.queue.complete(over.id).await;

    // Thirteen hours later the prior spend has left the window and the same
    // transfer passes the amount gate.
    harness.clock.advance(chrono::Duration::hours(13));
    let fresh = authorization_request(harness.org_id, alice, wallet, payload, "n-2");
    let fresh = submit(harness.store.as_ref(), harness.queue.as_ref(), fresh)
        .await
        .unwrap();
    let fresh = harness.node.process(fresh.id).await.unwrap();
    assert_eq!(fresh.status, RequestStatus::Permitted);
}

#[tokio::test]
async fn unrecognized_feed_source_fails_the_request() {
    let harness = TestHarness::new();
    let (builder, alice) = SnapshotBuilder::new().user(UserRole::Member, "alice-key");
    let (builder, wallet) = builder.wallet(Address::repeat_byte(0x01), Some(alice));
    harness.directory.set_snapshot(builder.build());
    harness.prices.set_source("rogue-oracle");

    let request = authorization_request(
        harness.org_id,
        alice,
        wallet,
        small_transfer(),
        "n-1",
    );
    let stored = submit(harness.store.as_ref(), harness.queue.as_ref(), request)
        .await
        .unwrap();

    assert!(harness.node.process(stored.id).await.is_err());
    let stored = harness.store.find_by_id(stored.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Failed);
    assert!(stored.failure_reason.unwrap().contains("rogue-oracle"));
}

#[tokio::test]
async fn worker_pool_drains_the_queue() {
    let harness = TestHarness::new();
    let (builder, alice) = SnapshotBuilder::new().user(UserRole::Member, "alice-key");
    let (builder, wallet) = builder.wallet(Address::repeat_byte(0x01), Some(alice));
    harness.directory.set_snapshot(builder.build());
    harness.policies.set_policies(vec![amount_gate(
        PolicyEffect::Permit,
        ComparisonOperator::Lte,
        Amount::parse(ONE_TOKEN).unwrap(),
    )]);
    // One transient failure per request exercises the in-place retry.
    harness.transfers.fail_transiently(2);

    let pool = WorkerPool::start(harness.node.clone(), harness.queue.clone());

    let mut ids = Vec::new();
    for index in 0..2 {
        let request = authorization_request(
            harness.org_id,
            alice,
            wallet,
            small_transfer(),
            &format!("n-{index}"),
        );
        let stored = submit(harness.store.as_ref(), harness.queue.as_ref(), request)
            .await
            .unwrap();
        ids.push(stored.id);
    }

    for id in &ids {
        let mut status = RequestStatus::Created;
        for _ in 0..200 {
            status = harness
                .store
                .find_by_id(*id)
                .await
                .unwrap()
                .unwrap()
                .status;
            if status.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(status, RequestStatus::Permitted);
    }

    pool.shutdown().await;
}

#[tokio::test]
async fn policy_provider_order_is_preserved() {
    let harness = TestHarness::new();
    let forbid = amount_gate(
        PolicyEffect::Forbid,
        ComparisonOperator::Gt,
        Amount::parse(ONE_TOKEN).unwrap(),
    );
    let permit = amount_gate(
        PolicyEffect::Permit,
        ComparisonOperator::Lte,
        Amount::parse(ONE_TOKEN).unwrap(),
    );
    harness
        .policies
        .set_policies(vec![forbid.clone(), permit.clone()]);
    let served = harness
        .policies
        .policies_for(harness.org_id, warden_core::WalletId::new())
        .await
        .unwrap();
    assert_eq!(served[0].id, forbid.id);
    assert_eq!(served[1].id, permit.id);
}
