//! Request intake
//!
//! Entry points that put requests onto the dispatch queue: initial
//! submission, and re-submission of a confirmed request once further
//! approvals have been collected.

use chrono::{DateTime, Utc};
use tracing::debug;

use warden_core::{RequestId, SignatureEnvelope};

use crate::error::{EngineError, EngineResult};
use crate::queue::JobQueue;
use crate::request::{AuthorizationRequest, RequestStatus};
use crate::store::RequestStore;

/// Persist a new request and enqueue it for evaluation
///
/// Creation is idempotent: when the request carries an idempotency key that
/// was seen before, the stored request is returned and nothing new is
/// enqueued.
pub async fn submit(
    store: &dyn RequestStore,
    queue: &dyn JobQueue,
    request: AuthorizationRequest,
) -> EngineResult<AuthorizationRequest> {
    let submitted_id = request.id;
    let stored = store.create(request).await?;
    if stored.id != submitted_id {
        debug!(request_id = %stored.id, "idempotent replay, returning stored request");
        return Ok(stored);
    }
    queue.enqueue(stored.id).await?;
    Ok(stored)
}

/// Attach an approval to a confirmed request and enqueue it again
pub async fn resubmit_with_approval(
    store: &dyn RequestStore,
    queue: &dyn JobQueue,
    request_id: RequestId,
    approval: SignatureEnvelope,
    now: DateTime<Utc>,
) -> EngineResult<AuthorizationRequest> {
    let mut request = store
        .find_by_id(request_id)
        .await?
        .ok_or(EngineError::NotFound { request_id })?;
    if request.status != RequestStatus::Confirmed {
        return Err(EngineError::InvalidTransition {
            from: request.status,
            to: RequestStatus::Processing,
        });
    }
    request.add_approval(approval, now);
    store.update(&request).await?;
    queue.enqueue(request.id).await?;
    Ok(request)
}
