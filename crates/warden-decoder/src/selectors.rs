//! Static selector table
//!
//! Maps 4-byte method selectors to the decoding schemas the engine
//! understands. An ambiguous selector (notably `transferFrom`, shared by
//! ERC-20 and ERC-721) maps to more than one schema; candidates are tried in
//! registration order and the first strict decode wins. That ordering is a
//! deliberate classification policy, not an accident: the strict decoder
//! cannot separate two schemas with the same parameter fingerprint, so the
//! registered order is the tiebreak.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::abi::AbiParam;

/// 4-byte method selector
pub type Selector = [u8; 4];

/// ERC-20 `transfer(address,uint256)`
pub const ERC20_TRANSFER: Selector = [0xa9, 0x05, 0x9c, 0xbb];
/// `transferFrom(address,address,uint256)` — shared by ERC-20 and ERC-721
pub const TRANSFER_FROM: Selector = [0x23, 0xb8, 0x72, 0xdd];
/// ERC-721 `safeTransferFrom(address,address,uint256)`
pub const ERC721_SAFE_TRANSFER_FROM: Selector = [0x42, 0x84, 0x2e, 0x0e];
/// ERC-721 `safeTransferFrom(address,address,uint256,bytes)`
pub const ERC721_SAFE_TRANSFER_FROM_BYTES: Selector = [0xb8, 0x8d, 0x4f, 0xde];
/// ERC-1155 `safeTransferFrom(address,address,uint256,uint256,bytes)`
pub const ERC1155_SAFE_TRANSFER_FROM: Selector = [0xf2, 0x42, 0x43, 0x2a];
/// ERC-1155 `safeBatchTransferFrom(address,address,uint256[],uint256[],bytes)`
pub const ERC1155_SAFE_BATCH_TRANSFER_FROM: Selector = [0x2e, 0xb2, 0xc2, 0xd6];

/// One decodable method shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferSchema {
    /// ERC-20 `transfer`
    Erc20Transfer,
    /// ERC-20 `transferFrom`
    Erc20TransferFrom,
    /// ERC-721 `transferFrom`
    Erc721TransferFrom,
    /// ERC-721 `safeTransferFrom` without trailing bytes
    Erc721SafeTransferFrom,
    /// ERC-721 `safeTransferFrom` with trailing bytes
    Erc721SafeTransferFromBytes,
    /// ERC-1155 single transfer
    Erc1155SafeTransferFrom,
    /// ERC-1155 batch transfer
    Erc1155SafeBatchTransferFrom,
}

impl TransferSchema {
    /// Parameter schema for this method
    pub fn params(&self) -> &'static [AbiParam] {
        match self {
            TransferSchema::Erc20Transfer => &[AbiParam::Address, AbiParam::Uint256],
            TransferSchema::Erc20TransferFrom
            | TransferSchema::Erc721TransferFrom
            | TransferSchema::Erc721SafeTransferFrom => {
                &[AbiParam::Address, AbiParam::Address, AbiParam::Uint256]
            }
            TransferSchema::Erc721SafeTransferFromBytes => &[
                AbiParam::Address,
                AbiParam::Address,
                AbiParam::Uint256,
                AbiParam::Bytes,
            ],
            TransferSchema::Erc1155SafeTransferFrom => &[
                AbiParam::Address,
                AbiParam::Address,
                AbiParam::Uint256,
                AbiParam::Uint256,
                AbiParam::Bytes,
            ],
            TransferSchema::Erc1155SafeBatchTransferFrom => &[
                AbiParam::Address,
                AbiParam::Address,
                AbiParam::Uint256Array,
                AbiParam::Uint256Array,
                AbiParam::Bytes,
            ],
        }
    }
}

static SELECTOR_TABLE: Lazy<HashMap<Selector, Vec<TransferSchema>>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert(ERC20_TRANSFER, vec![TransferSchema::Erc20Transfer]);
    // Registration order is the disambiguation order: the ERC-20 reading of
    // transferFrom is tried first.
    table.insert(
        TRANSFER_FROM,
        vec![
            TransferSchema::Erc20TransferFrom,
            TransferSchema::Erc721TransferFrom,
        ],
    );
    table.insert(
        ERC721_SAFE_TRANSFER_FROM,
        vec![TransferSchema::Erc721SafeTransferFrom],
    );
    table.insert(
        ERC721_SAFE_TRANSFER_FROM_BYTES,
        vec![TransferSchema::Erc721SafeTransferFromBytes],
    );
    table.insert(
        ERC1155_SAFE_TRANSFER_FROM,
        vec![TransferSchema::Erc1155SafeTransferFrom],
    );
    table.insert(
        ERC1155_SAFE_BATCH_TRANSFER_FROM,
        vec![TransferSchema::Erc1155SafeBatchTransferFrom],
    );
    table
});

/// Schemas registered for a selector, in disambiguation order
pub fn schemas_for(selector: Selector) -> Option<&'static [TransferSchema]> {
    SELECTOR_TABLE.get(&selector).map(Vec::as_slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_from_tries_erc20_first() {
        let schemas = schemas_for(TRANSFER_FROM).unwrap();
        assert_eq!(schemas[0], TransferSchema::Erc20TransferFrom);
        assert_eq!(schemas[1], TransferSchema::Erc721TransferFrom);
    }

    #[test]
    fn unknown_selector_has_no_schema() {
        assert!(schemas_for([0xde, 0xad, 0xbe, 0xef]).is_none());
    }
}
