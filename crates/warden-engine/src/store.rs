//! Request persistence
//!
//! Persistence technology is an external collaborator; the engine consumes
//! this trait only. The in-memory implementation backs tests and single-node
//! deployments.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;

use warden_core::{RequestId, WalletId};

use crate::error::{EngineError, EngineResult};
use crate::request::{AuthorizationRequest, RequestStatus};

/// Persistence interface for authorization requests
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Insert a request; a duplicate idempotency key returns the existing
    /// request instead of creating a new one
    async fn create(&self, request: AuthorizationRequest) -> EngineResult<AuthorizationRequest>;

    /// Persist the current state of a request
    async fn update(&self, request: &AuthorizationRequest) -> EngineResult<()>;

    /// Fetch a request by id
    async fn find_by_id(&self, id: RequestId) -> EngineResult<Option<AuthorizationRequest>>;

    /// Fetch all requests with the given status
    async fn find_by_status(&self, status: RequestStatus)
        -> EngineResult<Vec<AuthorizationRequest>>;

    /// Nonces consumed by permitted requests targeting the given wallet
    async fn consumed_nonces(&self, wallet_id: WalletId) -> EngineResult<HashSet<String>>;
}

/// In-memory store
#[derive(Default)]
pub struct InMemoryStore {
    requests: RwLock<HashMap<RequestId, AuthorizationRequest>>,
    idempotency: RwLock<HashMap<String, RequestId>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RequestStore for InMemoryStore {
    async fn create(&self, request: AuthorizationRequest) -> EngineResult<AuthorizationRequest> {
        if let Some(key) = &request.idempotency_key {
            if let Some(existing_id) = self.idempotency.read().get(key) {
                let requests = self.requests.read();
                return requests
                    .get(existing_id)
                    .cloned()
                    .ok_or_else(|| EngineError::store("idempotency index out of sync"));
            }
        }
        if let Some(key) = &request.idempotency_key {
            self.idempotency.write().insert(key.clone(), request.id);
        }
        self.requests.write().insert(request.id, request.clone());
        Ok(request)
    }

    async fn update(&self, request: &AuthorizationRequest) -> EngineResult<()> {
        let mut requests = self.requests.write();
        if !requests.contains_key(&request.id) {
            return Err(EngineError::NotFound {
                request_id: request.id,
            });
        }
        requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: RequestId) -> EngineResult<Option<AuthorizationRequest>> {
        Ok(self.requests.read().get(&id).cloned())
    }

    async fn find_by_status(
        &self,
        status: RequestStatus,
    ) -> EngineResult<Vec<AuthorizationRequest>> {
        Ok(self
            .requests
            .read()
            .values()
            .filter(|request| request.status == status)
            .cloned()
            .collect())
    }

    async fn consumed_nonces(&self, wallet_id: WalletId) -> EngineResult<HashSet<String>> {
        Ok(self
            .requests
            .read()
            .values()
            .filter(|request| {
                request.wallet_id == wallet_id && request.status == RequestStatus::Permitted
            })
            .map(|request| request.nonce.clone())
            .collect())
    }
}
