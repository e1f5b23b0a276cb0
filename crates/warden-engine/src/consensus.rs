//! Multi-node consensus
//!
//! Independent nodes evaluate the same request against the same inputs; the
//! request only advances when every node reached the same decision.
//! Divergence is never resolved by majority vote: it means the nodes saw
//! different policies or data, the request stays in `Processing`, and an
//! operator has to reconcile the nodes before re-dispatch.

use std::sync::Arc;

use tracing::{info, warn};

use warden_core::{NodeId, RequestId};
use warden_policy::Decision;

use crate::error::{EngineError, EngineResult};
use crate::machine::{status_for, EngineNode};
use crate::request::{AuthorizationRequest, Evaluation, RequestStatus};

/// Require every node's decision to be identical
///
/// Returns the agreed decision, or `Consensus` carrying every node's vote.
pub fn reconcile(
    request_id: RequestId,
    decisions: &[(NodeId, Decision)],
) -> EngineResult<Decision> {
    let mut iter = decisions.iter();
    let Some((_, first)) = iter.next() else {
        return Err(EngineError::store("no evaluations to reconcile"));
    };
    if iter.all(|(_, decision)| decision == first) {
        Ok(*first)
    } else {
        Err(EngineError::Consensus {
            request_id,
            decisions: decisions.to_vec(),
        })
    }
}

/// Runs one request through several nodes and applies the agreed outcome
pub struct ConsensusEvaluator {
    nodes: Vec<Arc<EngineNode>>,
}

impl ConsensusEvaluator {
    /// Create an evaluator over the participating nodes
    ///
    /// All nodes must share the same request store; the first node's store
    /// is used for persistence.
    pub fn new(nodes: Vec<Arc<EngineNode>>) -> Self {
        Self { nodes }
    }

    /// Evaluate the request on every node and advance it only on agreement
    pub async fn process(&self, request_id: RequestId) -> EngineResult<AuthorizationRequest> {
        let lead = self
            .nodes
            .first()
            .ok_or_else(|| EngineError::store("no nodes configured"))?;
        let store = lead.store();

        let mut request = store
            .find_by_id(request_id)
            .await?
            .ok_or(EngineError::NotFound { request_id })?;
        if request.status == RequestStatus::Processing {
            return Err(EngineError::AlreadyProcessing { request_id });
        }

        let now = lead.clock_now();
        request.transition(RequestStatus::Processing, now)?;
        store.update(&request).await?;

        let mut decisions = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            match node.evaluate_request(&request).await {
                Ok(response) => {
                    decisions.push((node.node_id(), response.decision));
                    let now = lead.clock_now();
                    request.record_evaluation(
                        Evaluation {
                            node_id: node.node_id(),
                            response,
                            created_at: now,
                        },
                        now,
                    );
                }
                Err(error) if error.is_transient() => {
                    let now = lead.clock_now();
                    request.transition(RequestStatus::Created, now)?;
                    store.update(&request).await?;
                    return Err(error);
                }
                Err(error) => {
                    let now = lead.clock_now();
                    request.failure_reason = Some(error.to_string());
                    request.transition(RequestStatus::Failed, now)?;
                    store.update(&request).await?;
                    return Err(error);
                }
            }
        }

        match reconcile(request_id, &decisions) {
            Ok(decision) => {
                let now = lead.clock_now();
                request.transition(status_for(decision), now)?;
                store.update(&request).await?;
                info!(request_id = %request_id, ?decision, nodes = decisions.len(), "consensus reached");
                Ok(request)
            }
            Err(error) => {
                // The request stays in Processing with every node's signed
                // response on record.
                store.update(&request).await?;
                warn!(request_id = %request_id, %error, "consensus divergence");
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn unanimous_decisions_reconcile() {
        let id = RequestId::new();
        let decisions = vec![
            (NodeId::new(), Decision::Permit),
            (NodeId::new(), Decision::Permit),
            (NodeId::new(), Decision::Permit),
        ];
        assert_eq!(reconcile(id, &decisions).unwrap(), Decision::Permit);
    }

    #[test]
    fn any_disagreement_is_divergence() {
        let id = RequestId::new();
        let decisions = vec![
            (NodeId::new(), Decision::Permit),
            (NodeId::new(), Decision::Permit),
            (NodeId::new(), Decision::Forbid),
        ];
        // Two against one is still divergence, never a majority win.
        assert_matches!(
            reconcile(id, &decisions),
            Err(EngineError::Consensus { request_id, decisions }) => {
                assert_eq!(request_id, id);
                assert_eq!(decisions.len(), 3);
            }
        );
    }

    #[test]
    fn empty_vote_set_is_an_error() {
        assert!(reconcile(RequestId::new(), &[]).is_err());
    }
}
