//! Evaluation state machine
//!
//! Drives one authorization request through a single evaluation attempt:
//! integrity check, intent decoding, collaborator fetches, policy
//! resolution, and the resulting status transition. Errors split into two
//! paths: transient collaborator failures roll the request back to `Created`
//! for redispatch, everything else lands in `Failed` with the reason
//! recorded.

use std::sync::Arc;

use tracing::{debug, info, warn};

use warden_core::{ChainRegistry, NodeId, RequestId};
use warden_decoder::decode;
use warden_policy::{resolve_and_sign, Decision, EvaluationContext, EvaluationResponse, ResponseSigner};

use crate::collaborators::{
    with_timeout, Clock, EntityDirectory, PolicyProvider, PriceFeed, TransferFeed,
};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::request::{AuthorizationRequest, Evaluation, RequestStatus};
use crate::store::RequestStore;

/// Everything an engine node talks to
#[derive(Clone)]
pub struct Collaborators {
    /// Request persistence
    pub store: Arc<dyn RequestStore>,
    /// Organizational directory
    pub directory: Arc<dyn EntityDirectory>,
    /// Transfer history
    pub transfers: Arc<dyn TransferFeed>,
    /// Asset prices
    pub prices: Arc<dyn PriceFeed>,
    /// Active policy sets
    pub policies: Arc<dyn PolicyProvider>,
    /// Response signer
    pub signer: Arc<dyn ResponseSigner>,
    /// Time source
    pub clock: Arc<dyn Clock>,
}

/// One evaluation node
pub struct EngineNode {
    node_id: NodeId,
    config: EngineConfig,
    registry: ChainRegistry,
    collaborators: Collaborators,
}

impl EngineNode {
    /// Create a node
    pub fn new(
        node_id: NodeId,
        config: EngineConfig,
        registry: ChainRegistry,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            node_id,
            config,
            registry,
            collaborators,
        }
    }

    /// This node's identifier
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// The node's configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The request store this node persists to
    pub fn store(&self) -> &Arc<dyn RequestStore> {
        &self.collaborators.store
    }

    /// Current time from the node's clock
    pub fn clock_now(&self) -> chrono::DateTime<chrono::Utc> {
        self.collaborators.clock.now()
    }

    /// Run one evaluation attempt for the given request
    ///
    /// Returns the request in its post-attempt state. `Err` means no final
    /// state was recorded: the request is contended, missing, or rolled back
    /// to `Created` after a transient failure.
    pub async fn process(&self, request_id: RequestId) -> EngineResult<AuthorizationRequest> {
        let store = &self.collaborators.store;
        let mut request = store
            .find_by_id(request_id)
            .await?
            .ok_or(EngineError::NotFound { request_id })?;

        if request.status == RequestStatus::Processing {
            return Err(EngineError::AlreadyProcessing { request_id });
        }

        let now = self.collaborators.clock.now();
        request.transition(RequestStatus::Processing, now)?;
        store.update(&request).await?;
        debug!(request_id = %request_id, node = %self.node_id, "evaluation started");

        match self.evaluate(&request).await {
            Ok(response) => {
                let decision = response.decision;
                let now = self.collaborators.clock.now();
                request.record_evaluation(
                    Evaluation {
                        node_id: self.node_id,
                        response,
                        created_at: now,
                    },
                    now,
                );
                request.transition(status_for(decision), now)?;
                store.update(&request).await?;
                info!(request_id = %request_id, ?decision, "evaluation complete");
                Ok(request)
            }
            Err(error) if error.is_transient() => {
                // Roll back so the queue can redispatch with backoff.
                let now = self.collaborators.clock.now();
                request.transition(RequestStatus::Created, now)?;
                store.update(&request).await?;
                warn!(request_id = %request_id, %error, "transient failure, re-queued");
                Err(error)
            }
            Err(error) => {
                let now = self.collaborators.clock.now();
                request.failure_reason = Some(error.to_string());
                request.transition(RequestStatus::Failed, now)?;
                store.update(&request).await?;
                warn!(request_id = %request_id, %error, "evaluation failed");
                Err(error)
            }
        }
    }

    /// Mark a request failed after its retry budget is exhausted
    ///
    /// The request is expected to sit in `Created` after a transient
    /// rollback; it is walked through `Processing` so the terminal
    /// transition stays monotonic.
    pub async fn mark_failed(
        &self,
        request_id: RequestId,
        reason: impl Into<String>,
    ) -> EngineResult<AuthorizationRequest> {
        let store = &self.collaborators.store;
        let mut request = store
            .find_by_id(request_id)
            .await?
            .ok_or(EngineError::NotFound { request_id })?;
        let now = self.collaborators.clock.now();
        if request.status == RequestStatus::Created {
            request.transition(RequestStatus::Processing, now)?;
        }
        request.failure_reason = Some(reason.into());
        request.transition(RequestStatus::Failed, now)?;
        store.update(&request).await?;
        Ok(request)
    }

    /// Assemble the context and resolve the active policies against it
    ///
    /// Pure with respect to the store apart from the consumed-nonce read; no
    /// status is recorded. Consensus runs use this to collect one response
    /// per node before any transition happens.
    pub async fn evaluate_request(
        &self,
        request: &AuthorizationRequest,
    ) -> EngineResult<EvaluationResponse> {
        self.evaluate(request).await
    }

    async fn evaluate(&self, request: &AuthorizationRequest) -> EngineResult<EvaluationResponse> {
        request.verify_integrity()?;

        let intent = match request.payload.transaction() {
            Some(tx) => Some(decode(&self.registry, tx)?),
            None => None,
        };

        let timeout = self.config.collaborator_timeout();
        let entities = with_timeout(
            timeout,
            "directory",
            self.collaborators.directory.snapshot(request.org_id),
        )
        .await?;
        let transfers = with_timeout(
            timeout,
            "transfer history",
            self.collaborators
                .transfers
                .transfers(request.org_id, request.wallet_id),
        )
        .await?;
        let prices =
            with_timeout(timeout, "prices", self.collaborators.prices.prices()).await?;
        let policies = with_timeout(
            timeout,
            "policies",
            self.collaborators
                .policies
                .policies_for(request.org_id, request.wallet_id),
        )
        .await?;
        let consumed_nonces = self
            .collaborators
            .store
            .consumed_nonces(request.wallet_id)
            .await?;

        let ctx = EvaluationContext {
            action: request.payload.action(),
            intent,
            principal: request.principal,
            wallet_id: request.wallet_id,
            payload: request.payload.clone(),
            request_hash: request.hash.clone(),
            nonce: request.nonce.clone(),
            consumed_nonces,
            approvals: request.approvals.clone(),
            entities,
            transfers,
            prices,
            now: self.collaborators.clock.now(),
        };
        ctx.check_feed_sources(&self.config.recognized_feed_sources)?;

        Ok(resolve_and_sign(&policies, &ctx, self.collaborators.signer.as_ref()).await?)
    }
}

pub(crate) fn status_for(decision: Decision) -> RequestStatus {
    match decision {
        Decision::Permit => RequestStatus::Permitted,
        Decision::Forbid => RequestStatus::Forbidden,
        Decision::Confirm => RequestStatus::Confirmed,
    }
}
