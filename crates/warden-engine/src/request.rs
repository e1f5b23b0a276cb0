//! Authorization requests and their lifecycle states
//!
//! A request's `hash` must equal the canonical digest of its payload at all
//! times; any mismatch invalidates the request before evaluation begins.
//! Status transitions are monotonic: a terminal state never regresses.
//! `Confirmed` is deliberately non-terminal, so a request can re-enter
//! `Processing` once more approvals arrive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_core::{
    hash, CoreResult, NodeId, OrgId, RequestId, RequestPayload, SignatureEnvelope, UserId, WalletId,
};
use warden_policy::EvaluationResponse;

use crate::error::{EngineError, EngineResult};

/// Lifecycle status of an authorization request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Accepted, waiting for dispatch
    Created,
    /// An evaluation is in flight
    Processing,
    /// Evaluation decided Permit
    Permitted,
    /// Evaluation decided Forbid
    Forbidden,
    /// Evaluation decided Confirm: more approvals required
    Confirmed,
    /// Unrecoverable error during decode or evaluation
    Failed,
}

impl RequestStatus {
    /// Whether this status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Permitted | RequestStatus::Forbidden | RequestStatus::Failed
        )
    }

    /// Whether a transition to `next` is allowed
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        match (self, next) {
            (RequestStatus::Created, RequestStatus::Processing) => true,
            // Transient failure falls back for re-queue.
            (RequestStatus::Processing, RequestStatus::Created) => true,
            (
                RequestStatus::Processing,
                RequestStatus::Permitted
                | RequestStatus::Forbidden
                | RequestStatus::Confirmed
                | RequestStatus::Failed,
            ) => true,
            // Re-submission with more approvals.
            (RequestStatus::Confirmed, RequestStatus::Processing) => true,
            _ => false,
        }
    }
}

/// One completed evaluation attempt
///
/// Evaluations are append-only: earlier attempts remain auditable across
/// retries and re-submissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Node that produced the response
    pub node_id: NodeId,
    /// The signed response
    pub response: EvaluationResponse,
    /// When the evaluation completed
    pub created_at: DateTime<Utc>,
}

/// One signing/permission intent submitted by a principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Request identifier; also the queue-level dedup key
    pub id: RequestId,
    /// Owning organization
    pub org_id: OrgId,
    /// Lifecycle status
    pub status: RequestStatus,
    /// Action-specific payload
    pub payload: RequestPayload,
    /// Canonical digest of `payload`, stamped at creation
    pub hash: String,
    /// Caller-supplied replay-prevention token, unique per wallet
    pub nonce: String,
    /// Requesting principal
    pub principal: UserId,
    /// Target wallet
    pub wallet_id: WalletId,
    /// Approval signatures collected so far
    pub approvals: Vec<SignatureEnvelope>,
    /// Append-only evaluation log
    pub evaluations: Vec<Evaluation>,
    /// Optional key for idempotent creation
    pub idempotency_key: Option<String>,
    /// Failure reason, set when status is Failed
    pub failure_reason: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl AuthorizationRequest {
    /// Create a request, stamping the canonical payload digest
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        org_id: OrgId,
        principal: UserId,
        wallet_id: WalletId,
        payload: RequestPayload,
        nonce: impl Into<String>,
        idempotency_key: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        let hash = hash::digest_hex(&payload)?;
        Ok(Self {
            id: RequestId::new(),
            org_id,
            status: RequestStatus::Created,
            payload,
            hash,
            nonce: nonce.into(),
            principal,
            wallet_id,
            approvals: Vec::new(),
            evaluations: Vec::new(),
            idempotency_key,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Recompute the payload digest and compare it to the stored hash
    pub fn verify_integrity(&self) -> EngineResult<()> {
        let recomputed = hash::digest_hex(&self.payload)?;
        if recomputed != self.hash {
            return Err(EngineError::Integrity {
                request_id: self.id,
                stored: self.hash.clone(),
                recomputed,
            });
        }
        Ok(())
    }

    /// Transition to a new status, enforcing monotonicity
    pub fn transition(&mut self, next: RequestStatus, now: DateTime<Utc>) -> EngineResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(EngineError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Append an evaluation to the audit log
    pub fn record_evaluation(&mut self, evaluation: Evaluation, now: DateTime<Utc>) {
        self.evaluations.push(evaluation);
        self.updated_at = now;
    }

    /// Attach an additional approval signature
    pub fn add_approval(&mut self, approval: SignatureEnvelope, now: DateTime<Utc>) {
        self.approvals.push(approval);
        self.updated_at = now;
    }
}
