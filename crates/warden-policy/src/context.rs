//! Evaluation context
//!
//! One immutable bundle of everything the evaluators may consult: the action,
//! the decoded intent, the requesting principal, the target wallet, collected
//! approvals, the directory snapshot, and the signed transfer/price feeds.
//! The resolver must never observe a torn read between criteria, so the
//! context is assembled once per evaluation and not mutated afterwards.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use warden_core::{
    Action, EntitySnapshot, Feed, PriceSheet, RequestPayload, SignatureEnvelope, Transfer, UserId,
    WalletId,
};
use warden_decoder::Intent;

use crate::error::{EvalError, EvalResult};

/// Immutable context for one evaluation pass
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    /// Action being requested
    pub action: Action,
    /// Decoded intent; `None` for non-transaction actions
    pub intent: Option<Intent>,
    /// Requesting principal
    pub principal: UserId,
    /// Target wallet
    pub wallet_id: WalletId,
    /// The request payload the stored hash covers
    pub payload: RequestPayload,
    /// Stored canonical hash of the payload
    pub request_hash: String,
    /// Caller-supplied replay-prevention token
    pub nonce: String,
    /// Nonces already consumed by permitted requests for this wallet
    pub consumed_nonces: HashSet<String>,
    /// Approval signatures collected so far
    pub approvals: Vec<SignatureEnvelope>,
    /// Organizational directory snapshot
    pub entities: EntitySnapshot,
    /// Historical transfers feed
    pub transfers: Feed<Vec<Transfer>>,
    /// Price feed
    pub prices: Feed<PriceSheet>,
    /// Evaluation instant; rolling windows end here
    pub now: DateTime<Utc>,
}

impl EvaluationContext {
    /// Reject feeds whose source is not in the recognized set
    ///
    /// Feed signatures are verified by the collaborator that fetched them;
    /// the engine's own obligation is attribution only.
    pub fn check_feed_sources(&self, recognized: &HashSet<String>) -> EvalResult<()> {
        for source in [&self.transfers.source, &self.prices.source] {
            if !recognized.contains(source) {
                return Err(EvalError::UnrecognizedFeed {
                    feed_source: source.clone(),
                });
            }
        }
        Ok(())
    }

    /// Chain id of the embedded transaction, when the action is
    /// SignTransaction
    pub fn chain_id(&self) -> Option<u64> {
        self.payload.transaction().map(|tx| tx.chain_id)
    }
}
