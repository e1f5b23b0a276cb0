//! Transaction classification
//!
//! Pure function over the chain registry and a raw transaction request. No
//! execution, no simulation: calldata the selector table cannot interpret
//! classifies as a contract call and is left for the default-deny policy.

use alloy_primitives::Address;
use tracing::debug;

use warden_core::{Amount, AssetId, AssetKind, ChainRegistry, TransactionRequest};

use crate::abi::{decode_params, AbiValue};
use crate::error::{DecodeError, DecodeResult};
use crate::intent::{Erc1155Transfer, Intent};
use crate::selectors::{schemas_for, Selector, TransferSchema};

/// Decode a raw transaction request into a semantic intent
pub fn decode(registry: &ChainRegistry, tx: &TransactionRequest) -> DecodeResult<Intent> {
    let chain = registry
        .chain(tx.chain_id)
        .ok_or(DecodeError::UnknownChain {
            chain_id: tx.chain_id,
        })?;

    let data = tx.data.as_ref().map_or(&[][..], |bytes| bytes.as_ref());
    if data.is_empty() {
        return Ok(match (tx.value, tx.to) {
            (Some(amount), Some(to)) => Intent::TransferNative {
                asset: AssetId::native(tx.chain_id, chain.slip44),
                amount,
                to,
            },
            _ => Intent::Unknown,
        });
    }

    if data.len() < 4 {
        return Err(DecodeError::malformed(format!(
            "calldata is {} bytes, selector needs 4",
            data.len()
        )));
    }

    // Calldata with no recipient is contract creation; nothing to classify.
    let Some(contract) = tx.to else {
        return Ok(Intent::Unknown);
    };

    let mut selector: Selector = [0u8; 4];
    selector.copy_from_slice(&data[..4]);
    let args = &data[4..];

    let Some(schemas) = schemas_for(selector) else {
        debug!(selector = %hex::encode(selector), %contract, "unrecognized selector");
        return Ok(Intent::ContractCall {
            contract,
            selector: format!("0x{}", hex::encode(selector)),
        });
    };

    // Candidates are tried in registration order; the first strict decode
    // wins. See the selector table for the disambiguation policy.
    let mut last_error = None;
    for schema in schemas {
        match decode_params(schema.params(), args)
            .and_then(|values| build_intent(*schema, tx.chain_id, contract, &values))
        {
            Ok(intent) => return Ok(intent),
            Err(error) => last_error = Some(error),
        }
    }
    Err(last_error
        .unwrap_or_else(|| DecodeError::malformed("selector registered with no schema")))
}

fn build_intent(
    schema: TransferSchema,
    chain_id: u64,
    contract: Address,
    values: &[AbiValue],
) -> DecodeResult<Intent> {
    let address_at = |index: usize| {
        values
            .get(index)
            .and_then(AbiValue::as_address)
            .ok_or_else(|| DecodeError::malformed(format!("expected address at arg {index}")))
    };
    let uint_at = |index: usize| {
        values
            .get(index)
            .and_then(AbiValue::as_uint)
            .map(Amount::from)
            .ok_or_else(|| DecodeError::malformed(format!("expected uint256 at arg {index}")))
    };

    match schema {
        TransferSchema::Erc20Transfer => Ok(Intent::TransferErc20 {
            token: AssetId::token(chain_id, AssetKind::Erc20, contract),
            to: address_at(0)?,
            amount: uint_at(1)?,
        }),
        TransferSchema::Erc20TransferFrom => Ok(Intent::TransferErc20 {
            token: AssetId::token(chain_id, AssetKind::Erc20, contract),
            to: address_at(1)?,
            amount: uint_at(2)?,
        }),
        TransferSchema::Erc721TransferFrom
        | TransferSchema::Erc721SafeTransferFrom
        | TransferSchema::Erc721SafeTransferFromBytes => Ok(Intent::TransferErc721 {
            token: AssetId::token(chain_id, AssetKind::Erc721, contract),
            to: address_at(1)?,
            token_id: uint_at(2)?,
        }),
        TransferSchema::Erc1155SafeTransferFrom => Ok(Intent::TransferErc1155 {
            token: AssetId::token(chain_id, AssetKind::Erc1155, contract),
            to: address_at(1)?,
            transfers: vec![Erc1155Transfer {
                token_id: uint_at(2)?,
                amount: uint_at(3)?,
            }],
        }),
        TransferSchema::Erc1155SafeBatchTransferFrom => {
            let to = address_at(1)?;
            let ids = values
                .get(2)
                .and_then(AbiValue::as_uint_array)
                .ok_or_else(|| DecodeError::malformed("expected uint256[] at arg 2"))?;
            let amounts = values
                .get(3)
                .and_then(AbiValue::as_uint_array)
                .ok_or_else(|| DecodeError::malformed("expected uint256[] at arg 3"))?;
            if ids.len() != amounts.len() {
                return Err(DecodeError::malformed(format!(
                    "batch id/amount length mismatch: {} vs {}",
                    ids.len(),
                    amounts.len()
                )));
            }
            let transfers = ids
                .iter()
                .zip(amounts)
                .map(|(id, amount)| Erc1155Transfer {
                    token_id: Amount::from(*id),
                    amount: Amount::from(*amount),
                })
                .collect();
            Ok(Intent::TransferErc1155 {
                token: AssetId::token(chain_id, AssetKind::Erc1155, contract),
                to,
                transfers,
            })
        }
    }
}
