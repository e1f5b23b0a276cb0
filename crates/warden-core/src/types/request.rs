//! Actions and request payloads
//!
//! A request payload is the caller-supplied content of an authorization
//! request, keyed by action. It is what the canonical request hash covers.

use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};

use crate::amount::Amount;

/// What the caller is asking permission to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Sign a transaction
    SignTransaction,
    /// Sign an arbitrary message
    SignMessage,
    /// Grant a permission to another principal
    GrantPermission,
}

/// A raw transaction request prior to intent decoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Sender address
    pub from: Address,
    /// Recipient address; absent for contract creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// EIP-155 chain id
    pub chain_id: u64,
    /// Native value in base units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Amount>,
    /// Calldata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    /// Transaction nonce chosen by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    /// Gas limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<Amount>,
}

/// Action-specific request payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RequestPayload {
    /// Sign a transaction
    SignTransaction {
        /// The transaction to sign
        transaction: TransactionRequest,
    },
    /// Sign an arbitrary message
    SignMessage {
        /// The message to sign
        message: String,
    },
    /// Grant a named permission
    GrantPermission {
        /// Permissions being granted
        permissions: Vec<String>,
    },
}

impl RequestPayload {
    /// The action this payload carries
    pub fn action(&self) -> Action {
        match self {
            RequestPayload::SignTransaction { .. } => Action::SignTransaction,
            RequestPayload::SignMessage { .. } => Action::SignMessage,
            RequestPayload::GrantPermission { .. } => Action::GrantPermission,
        }
    }

    /// The embedded transaction request, when the action is SignTransaction
    pub fn transaction(&self) -> Option<&TransactionRequest> {
        match self {
            RequestPayload::SignTransaction { transaction } => Some(transaction),
            _ => None,
        }
    }
}
