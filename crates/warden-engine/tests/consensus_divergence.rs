//! Multi-node agreement scenarios

use std::sync::Arc;

use alloy_primitives::Address;
use assert_matches::assert_matches;

use warden_core::{Amount, ComparisonOperator, UserRole};
use warden_engine::{
    submit, ConsensusEvaluator, EngineError, RequestStatus, RequestStore,
};
use warden_policy::PolicyEffect;
use warden_testkit::{
    amount_gate, authorization_request, native_transfer_payload, SnapshotBuilder,
    StaticPolicyProvider, TestHarness,
};

const ONE_TOKEN: &str = "1000000000000000000";

fn permissive_policy() -> warden_policy::Policy {
    amount_gate(
        PolicyEffect::Permit,
        ComparisonOperator::Lte,
        Amount::parse(ONE_TOKEN).unwrap(),
    )
}

#[tokio::test]
async fn agreeing_nodes_advance_the_request() {
    let harness = TestHarness::new();
    let (builder, alice) = SnapshotBuilder::new().user(UserRole::Member, "alice-key");
    let (builder, wallet) = builder.wallet(Address::repeat_byte(0x01), Some(alice));
    harness.directory.set_snapshot(builder.build());
    harness.policies.set_policies(vec![permissive_policy()]);

    let peer = harness.peer_node(Arc::new(StaticPolicyProvider::with_policies(vec![
        permissive_policy(),
    ])));
    let evaluator = ConsensusEvaluator::new(vec![harness.node.clone(), peer]);

    let request = authorization_request(
        harness.org_id,
        alice,
        wallet,
        native_transfer_payload(
            137,
            Address::repeat_byte(0x01),
            Address::repeat_byte(0x02),
            Amount::parse("100").unwrap(),
        ),
        "n-1",
    );
    let stored = submit(harness.store.as_ref(), harness.queue.as_ref(), request)
        .await
        .unwrap();

    let processed = evaluator.process(stored.id).await.unwrap();
    assert_eq!(processed.status, RequestStatus::Permitted);
    assert_eq!(processed.evaluations.len(), 2);
}

#[tokio::test]
async fn diverging_nodes_leave_the_request_in_processing() {
    let harness = TestHarness::new();
    let (builder, alice) = SnapshotBuilder::new().user(UserRole::Member, "alice-key");
    let (builder, wallet) = builder.wallet(Address::repeat_byte(0x01), Some(alice));
    harness.directory.set_snapshot(builder.build());
    harness.policies.set_policies(vec![permissive_policy()]);

    // The peer serves no policies at all, so it default-denies.
    let peer = harness.peer_node(Arc::new(StaticPolicyProvider::default()));
    let evaluator = ConsensusEvaluator::new(vec![harness.node.clone(), peer]);

    let request = authorization_request(
        harness.org_id,
        alice,
        wallet,
        native_transfer_payload(
            137,
            Address::repeat_byte(0x01),
            Address::repeat_byte(0x02),
            Amount::parse("100").unwrap(),
        ),
        "n-1",
    );
    let stored = submit(harness.store.as_ref(), harness.queue.as_ref(), request)
        .await
        .unwrap();

    let error = evaluator.process(stored.id).await.unwrap_err();
    assert_matches!(error, EngineError::Consensus { ref decisions, .. } => {
        assert_eq!(decisions.len(), 2);
    });
    assert!(error.needs_operator());

    // No majority resolution: the request sits in Processing with both
    // signed responses recorded for the operator.
    let stored = harness.store.find_by_id(stored.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Processing);
    assert_eq!(stored.evaluations.len(), 2);
}
