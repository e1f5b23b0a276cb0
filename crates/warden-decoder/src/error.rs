//! Decoder error taxonomy
//!
//! An unsupported selector is not an error: it classifies as
//! [`Intent::ContractCall`](crate::Intent::ContractCall) and the default-deny
//! policy catches it downstream.

use serde::{Deserialize, Serialize};

/// Errors raised while decoding a transaction request into an intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum DecodeError {
    /// The request's chain id is not present in the chain registry
    #[error("unknown chain id {chain_id}")]
    UnknownChain {
        /// The unresolvable chain id
        chain_id: u64,
    },

    /// Calldata is too short or inconsistent for every candidate schema
    #[error("malformed calldata: {message}")]
    MalformedCalldata {
        /// What failed to decode
        message: String,
    },
}

impl DecodeError {
    /// Create a malformed-calldata error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedCalldata {
            message: message.into(),
        }
    }
}

/// Result alias for decoder operations
pub type DecodeResult<T> = Result<T, DecodeError>;
