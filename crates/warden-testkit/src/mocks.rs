//! Mock engine collaborators
//!
//! Each mock serves data set by the test and can be told to fail
//! transiently for the next N calls or to stall past the collaborator
//! timeout, which is how retry and rollback paths are exercised.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use warden_core::{
    Amount, AssetId, EntitySnapshot, Feed, FiatCurrency, OrgId, PriceSheet, Transfer, WalletId,
};
use warden_engine::{EngineError, EngineResult, EntityDirectory, PolicyProvider, PriceFeed, TransferFeed};
use warden_policy::Policy;

/// Failure knobs shared by all mocks
#[derive(Default)]
struct Faults {
    transient_failures: RwLock<u32>,
    stall: RwLock<Option<Duration>>,
}

impl Faults {
    async fn apply(&self, label: &str) -> EngineResult<()> {
        let stall = *self.stall.read();
        if let Some(duration) = stall {
            tokio::time::sleep(duration).await;
        }
        {
            let mut remaining = self.transient_failures.write();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(EngineError::transient(format!("{label} unavailable")));
            }
        }
        Ok(())
    }
}

/// Directory mock serving one snapshot
#[derive(Default)]
pub struct MockDirectory {
    snapshot: RwLock<EntitySnapshot>,
    faults: Faults,
}

impl MockDirectory {
    /// Mock serving the given snapshot
    pub fn with_snapshot(snapshot: EntitySnapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
            faults: Faults::default(),
        }
    }

    /// Replace the served snapshot
    pub fn set_snapshot(&self, snapshot: EntitySnapshot) {
        *self.snapshot.write() = snapshot;
    }

    /// Fail the next `count` calls with a transient error
    pub fn fail_transiently(&self, count: u32) {
        *self.faults.transient_failures.write() = count;
    }
}

#[async_trait]
impl EntityDirectory for MockDirectory {
    async fn snapshot(&self, _org_id: OrgId) -> EngineResult<EntitySnapshot> {
        self.faults.apply("directory").await?;
        Ok(self.snapshot.read().clone())
    }
}

/// Transfer-history mock
pub struct MockTransferFeed {
    source: RwLock<String>,
    transfers: RwLock<Vec<Transfer>>,
    faults: Faults,
}

impl Default for MockTransferFeed {
    fn default() -> Self {
        Self {
            source: RwLock::new("transfer-history".to_string()),
            transfers: RwLock::new(Vec::new()),
            faults: Faults::default(),
        }
    }
}

impl MockTransferFeed {
    /// Empty history under the default recognized source
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a historical transfer
    pub fn push(&self, transfer: Transfer) {
        self.transfers.write().push(transfer);
    }

    /// Serve under a different feed source name
    pub fn set_source(&self, source: impl Into<String>) {
        *self.source.write() = source.into();
    }

    /// Fail the next `count` calls with a transient error
    pub fn fail_transiently(&self, count: u32) {
        *self.faults.transient_failures.write() = count;
    }

    /// Delay every response, long enough to trip the collaborator timeout
    pub fn stall_for(&self, duration: Duration) {
        *self.faults.stall.write() = Some(duration);
    }
}

#[async_trait]
impl TransferFeed for MockTransferFeed {
    async fn transfers(
        &self,
        _org_id: OrgId,
        wallet_id: WalletId,
    ) -> EngineResult<Feed<Vec<Transfer>>> {
        self.faults.apply("transfer history").await?;
        let data: Vec<Transfer> = self
            .transfers
            .read()
            .iter()
            .filter(|transfer| transfer.wallet_id == wallet_id)
            .cloned()
            .collect();
        Ok(Feed::new(self.source.read().clone(), "00", data))
    }
}

/// Price mock
pub struct MockPriceFeed {
    source: RwLock<String>,
    sheet: RwLock<PriceSheet>,
    faults: Faults,
}

impl Default for MockPriceFeed {
    fn default() -> Self {
        Self {
            source: RwLock::new("price-oracle".to_string()),
            sheet: RwLock::new(PriceSheet::default()),
            faults: Faults::default(),
        }
    }
}

impl MockPriceFeed {
    /// Empty sheet under the default recognized source
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fiat price of one base unit of an asset, 1e18-scaled
    pub fn set_price(&self, asset: AssetId, currency: FiatCurrency, price: Amount) {
        self.sheet.write().set_price(asset, currency, price);
    }

    /// Serve under a different feed source name
    pub fn set_source(&self, source: impl Into<String>) {
        *self.source.write() = source.into();
    }

    /// Fail the next `count` calls with a transient error
    pub fn fail_transiently(&self, count: u32) {
        *self.faults.transient_failures.write() = count;
    }
}

#[async_trait]
impl PriceFeed for MockPriceFeed {
    async fn prices(&self) -> EngineResult<Feed<PriceSheet>> {
        self.faults.apply("prices").await?;
        Ok(Feed::new(
            self.source.read().clone(),
            "00",
            self.sheet.read().clone(),
        ))
    }
}

/// Policy provider serving a fixed, ordered policy set
#[derive(Default)]
pub struct StaticPolicyProvider {
    policies: RwLock<Vec<Policy>>,
}

impl StaticPolicyProvider {
    /// Provider serving the given policies in order
    pub fn with_policies(policies: Vec<Policy>) -> Self {
        Self {
            policies: RwLock::new(policies),
        }
    }

    /// Replace the served policy set
    pub fn set_policies(&self, policies: Vec<Policy>) {
        *self.policies.write() = policies;
    }
}

#[async_trait]
impl PolicyProvider for StaticPolicyProvider {
    async fn policies_for(
        &self,
        _org_id: OrgId,
        _wallet_id: WalletId,
    ) -> EngineResult<Vec<Policy>> {
        Ok(self.policies.read().clone())
    }
}
