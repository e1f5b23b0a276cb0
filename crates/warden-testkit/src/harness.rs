//! Assembled engine with mock collaborators

use std::sync::Arc;

use warden_core::{ChainRegistry, NodeId, OrgId};
use warden_engine::{Collaborators, EngineConfig, EngineNode, InMemoryQueue, InMemoryStore};
use warden_policy::Ed25519ResponseSigner;

use crate::clock::FixedClock;
use crate::mocks::{MockDirectory, MockPriceFeed, MockTransferFeed, StaticPolicyProvider};

/// One engine node wired to mock collaborators, with handles kept for
/// steering from the test
pub struct TestHarness {
    /// Org all harness requests belong to
    pub org_id: OrgId,
    /// The node under test
    pub node: Arc<EngineNode>,
    /// Shared request store
    pub store: Arc<InMemoryStore>,
    /// Dispatch queue
    pub queue: Arc<InMemoryQueue>,
    /// Directory mock
    pub directory: Arc<MockDirectory>,
    /// Transfer-history mock
    pub transfers: Arc<MockTransferFeed>,
    /// Price mock
    pub prices: Arc<MockPriceFeed>,
    /// Policy provider
    pub policies: Arc<StaticPolicyProvider>,
    /// Pinned clock
    pub clock: Arc<FixedClock>,
}

impl TestHarness {
    /// Harness with empty mocks and tight timeouts
    pub fn new() -> Self {
        crate::logging::init_tracing();
        let store = Arc::new(InMemoryStore::new());
        let queue = Arc::new(InMemoryQueue::new());
        let directory = Arc::new(MockDirectory::default());
        let transfers = Arc::new(MockTransferFeed::new());
        let prices = Arc::new(MockPriceFeed::new());
        let policies = Arc::new(StaticPolicyProvider::default());
        let clock = Arc::new(FixedClock::default_epoch());

        let config = EngineConfig {
            worker_count: 2,
            collaborator_timeout_ms: 200,
            retry_backoff_ms: 10,
            max_retries: 2,
            ..Default::default()
        };
        let node = Arc::new(EngineNode::new(
            NodeId::new(),
            config,
            ChainRegistry::with_default_chains(),
            Collaborators {
                store: store.clone(),
                directory: directory.clone(),
                transfers: transfers.clone(),
                prices: prices.clone(),
                policies: policies.clone(),
                signer: Arc::new(Ed25519ResponseSigner::generate()),
                clock: clock.clone(),
            },
        ));

        Self {
            org_id: OrgId::new(),
            node,
            store,
            queue,
            directory,
            transfers,
            prices,
            policies,
            clock,
        }
    }

    /// Additional node sharing this harness's store, data mocks, and clock,
    /// but serving its own policy set
    pub fn peer_node(&self, policies: Arc<StaticPolicyProvider>) -> Arc<EngineNode> {
        Arc::new(EngineNode::new(
            NodeId::new(),
            self.node.config().clone(),
            ChainRegistry::with_default_chains(),
            Collaborators {
                store: self.store.clone(),
                directory: self.directory.clone(),
                transfers: self.transfers.clone(),
                prices: self.prices.clone(),
                policies,
                signer: Arc::new(Ed25519ResponseSigner::generate()),
                clock: self.clock.clone(),
            },
        ))
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
