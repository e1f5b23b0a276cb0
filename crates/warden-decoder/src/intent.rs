//! Semantic transaction intents
//!
//! An intent is a derived, read-only projection of a transaction request for
//! the duration of one evaluation. It is never persisted independently of the
//! request it was derived from.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use warden_core::{Amount, AssetId};

/// One id/amount pair inside an ERC-1155 transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc1155Transfer {
    /// Token id within the contract
    pub token_id: Amount,
    /// Units transferred
    pub amount: Amount,
}

/// Normalized semantic meaning of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    /// Native coin transfer
    TransferNative {
        /// Native asset of the chain
        asset: AssetId,
        /// Amount in base units
        amount: Amount,
        /// Recipient
        to: Address,
    },
    /// ERC-20 token transfer
    TransferErc20 {
        /// Token asset
        token: AssetId,
        /// Amount in base units
        amount: Amount,
        /// Recipient
        to: Address,
    },
    /// ERC-721 token transfer
    TransferErc721 {
        /// Token asset
        token: AssetId,
        /// Token id being transferred
        token_id: Amount,
        /// Recipient
        to: Address,
    },
    /// ERC-1155 transfer, single or batch
    TransferErc1155 {
        /// Token asset
        token: AssetId,
        /// Recipient
        to: Address,
        /// Transferred id/amount pairs
        transfers: Vec<Erc1155Transfer>,
    },
    /// Call to a contract the engine cannot interpret further
    ContractCall {
        /// Target contract
        contract: Address,
        /// Raw method selector, hex encoded
        selector: String,
    },
    /// Nothing the decoder could classify
    Unknown,
}

/// Discriminant of an [`Intent`], used by membership criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    /// Native coin transfer
    TransferNative,
    /// ERC-20 transfer
    TransferErc20,
    /// ERC-721 transfer
    TransferErc721,
    /// ERC-1155 transfer
    TransferErc1155,
    /// Uninterpreted contract call
    ContractCall,
    /// Unclassifiable
    Unknown,
}

impl Intent {
    /// The intent's discriminant
    pub fn intent_type(&self) -> IntentType {
        match self {
            Intent::TransferNative { .. } => IntentType::TransferNative,
            Intent::TransferErc20 { .. } => IntentType::TransferErc20,
            Intent::TransferErc721 { .. } => IntentType::TransferErc721,
            Intent::TransferErc1155 { .. } => IntentType::TransferErc1155,
            Intent::ContractCall { .. } => IntentType::ContractCall,
            Intent::Unknown => IntentType::Unknown,
        }
    }

    /// The asset being moved, when this intent moves one
    pub fn token(&self) -> Option<&AssetId> {
        match self {
            Intent::TransferNative { asset, .. } => Some(asset),
            Intent::TransferErc20 { token, .. }
            | Intent::TransferErc721 { token, .. }
            | Intent::TransferErc1155 { token, .. } => Some(token),
            Intent::ContractCall { .. } | Intent::Unknown => None,
        }
    }

    /// The fungible amount moved, when one is defined
    ///
    /// ERC-721 transfers move a token id, not an amount; ERC-1155 transfers
    /// report the sum of their per-id amounts.
    pub fn amount(&self) -> Option<Amount> {
        match self {
            Intent::TransferNative { amount, .. } | Intent::TransferErc20 { amount, .. } => {
                Some(*amount)
            }
            Intent::TransferErc1155 { transfers, .. } => transfers
                .iter()
                .try_fold(Amount::ZERO, |acc, t| acc.checked_add(t.amount)),
            Intent::TransferErc721 { .. } | Intent::ContractCall { .. } | Intent::Unknown => None,
        }
    }

    /// The destination address, when one is defined
    pub fn destination(&self) -> Option<Address> {
        match self {
            Intent::TransferNative { to, .. }
            | Intent::TransferErc20 { to, .. }
            | Intent::TransferErc721 { to, .. }
            | Intent::TransferErc1155 { to, .. } => Some(*to),
            Intent::ContractCall { contract, .. } => Some(*contract),
            Intent::Unknown => None,
        }
    }

    /// The contract being called, for intents that target one
    pub fn contract(&self) -> Option<Address> {
        match self {
            Intent::ContractCall { contract, .. } => Some(*contract),
            Intent::TransferErc20 { token, .. }
            | Intent::TransferErc721 { token, .. }
            | Intent::TransferErc1155 { token, .. } => token.address(),
            Intent::TransferNative { .. } | Intent::Unknown => None,
        }
    }
}
