//! Engine error taxonomy
//!
//! Splits failures into three families with different handling: caller-input
//! errors recover into a Failed terminal status, transient collaborator
//! failures are retried with backoff, and structural errors (duplicate
//! dispatch, consensus divergence) are surfaced for operator intervention and
//! never retried automatically.

use warden_core::{CoreError, NodeId, RequestId};
use warden_decoder::DecodeError;
use warden_policy::{Decision, EvalError};

use crate::request::RequestStatus;

/// Errors raised while driving a request through its lifecycle
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// Intent decoding failed on caller input
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Criterion evaluation or response signing failed
    #[error(transparent)]
    Eval(#[from] EvalError),

    /// Shared core failure (hashing, identifiers)
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Stored hash does not match the recomputed canonical digest
    #[error("integrity failure for {request_id}: stored {stored}, recomputed {recomputed}")]
    Integrity {
        /// The tampered request
        request_id: RequestId,
        /// Hash stored on the request
        stored: String,
        /// Digest recomputed from the payload
        recomputed: String,
    },

    /// A second dispatch arrived while an evaluation is already in flight
    #[error("request {request_id} is already processing")]
    AlreadyProcessing {
        /// The contended request
        request_id: RequestId,
    },

    /// Independent engine nodes reached different decisions
    ///
    /// Never resolved by majority vote: divergence indicates policy or data
    /// drift between nodes and must be investigated.
    #[error("consensus divergence for {request_id}: {decisions:?}")]
    Consensus {
        /// The disputed request
        request_id: RequestId,
        /// Decision reached by each participating node
        decisions: Vec<(NodeId, Decision)>,
    },

    /// A status transition that would violate monotonicity
    #[error("invalid transition {from:?} -> {to:?}")]
    InvalidTransition {
        /// Current status
        from: RequestStatus,
        /// Requested status
        to: RequestStatus,
    },

    /// Request not found in the store
    #[error("request {request_id} not found")]
    NotFound {
        /// The missing request
        request_id: RequestId,
    },

    /// Persistence failure
    #[error("store error: {message}")]
    Store {
        /// What went wrong
        message: String,
    },

    /// Engine configuration could not be loaded or is invalid
    #[error("config error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// A collaborator timed out or is temporarily unavailable
    ///
    /// Retryable: the request's status falls back so the queue can
    /// redispatch with backoff. Never a decision outcome.
    #[error("transient failure: {message}")]
    Transient {
        /// What was unavailable
        message: String,
    },
}

impl EngineError {
    /// Create a transient error
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the queue layer may retry this failure with backoff
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Whether this failure requires operator intervention instead of any
    /// automatic handling
    pub fn needs_operator(&self) -> bool {
        matches!(
            self,
            Self::AlreadyProcessing { .. } | Self::Consensus { .. }
        )
    }
}

/// Result alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
