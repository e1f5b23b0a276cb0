//! External collaborator interfaces
//!
//! The engine never owns organizational data, transfer history, prices, or
//! the active policy set; it fetches all of them per evaluation through these
//! traits. Every fetch is bounded by the configured timeout, and a timeout
//! surfaces as a transient error so the request is retried rather than
//! decided on stale or missing data.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use warden_core::{EntitySnapshot, Feed, OrgId, PriceSheet, Transfer, WalletId};
use warden_policy::Policy;

use crate::error::{EngineError, EngineResult};

/// Source of the organizational directory snapshot
#[async_trait]
pub trait EntityDirectory: Send + Sync {
    /// Fetch the current users, groups, wallets, and address book for an org
    async fn snapshot(&self, org_id: OrgId) -> EngineResult<EntitySnapshot>;
}

/// Source of historical transfers for spending-limit accounting
#[async_trait]
pub trait TransferFeed: Send + Sync {
    /// Fetch signed transfer history relevant to the given wallet
    async fn transfers(
        &self,
        org_id: OrgId,
        wallet_id: WalletId,
    ) -> EngineResult<Feed<Vec<Transfer>>>;
}

/// Source of signed asset prices
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Fetch the current price sheet
    async fn prices(&self) -> EngineResult<Feed<PriceSheet>>;
}

/// Source of the active policy set
#[async_trait]
pub trait PolicyProvider: Send + Sync {
    /// Fetch the ordered policies attached to a wallet
    ///
    /// Order matters: the resolver scans policies in this order when
    /// reporting matched rules.
    async fn policies_for(&self, org_id: OrgId, wallet_id: WalletId) -> EngineResult<Vec<Policy>>;
}

/// Time source, injectable so tests control the window arithmetic
pub trait Clock: Send + Sync {
    /// Current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Bound a collaborator call, converting a timeout into a transient error
pub async fn with_timeout<T, F>(duration: Duration, label: &str, fut: F) -> EngineResult<T>
where
    F: Future<Output = EngineResult<T>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(EngineError::transient(format!("{label} timed out"))),
    }
}
