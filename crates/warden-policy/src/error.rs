//! Evaluation error taxonomy
//!
//! A criterion that is simply not met is a normal `false` outcome, never an
//! error. These errors cover malformed or missing context only; the resolver
//! maps them to "criterion not satisfied" with an attached diagnostic rather
//! than crashing the evaluation.

use serde::{Deserialize, Serialize};

/// Errors raised while evaluating criteria or signing responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum EvalError {
    /// Context the evaluator needs is absent or malformed
    #[error("missing context: {message}")]
    MissingContext {
        /// What was missing
        message: String,
    },

    /// An approval's public key does not resolve to any directory credential
    #[error("unresolvable credential for pub key {pub_key}")]
    UnresolvableCredential {
        /// The unresolvable public key, hex encoded
        pub_key: String,
    },

    /// A feed's source is not in the recognized set
    ///
    /// The field cannot be called `source`; thiserror would treat it as the
    /// error's cause.
    #[error("unrecognized feed source {feed_source:?}")]
    UnrecognizedFeed {
        /// The offending source identifier
        feed_source: String,
    },

    /// Signing the evaluation response failed
    #[error("response signing failed: {message}")]
    Signing {
        /// What went wrong
        message: String,
    },
}

impl EvalError {
    /// Create a missing-context error
    pub fn missing_context(message: impl Into<String>) -> Self {
        Self::MissingContext {
            message: message.into(),
        }
    }

    /// Create a signing error
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }
}

/// Result alias for evaluation operations
pub type EvalResult<T> = Result<T, EvalError>;
