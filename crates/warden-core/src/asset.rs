//! Chain-scoped asset identifiers
//!
//! Wire format: `"<namespace>:<chainId>/<assetType>:<reference>"`, e.g.
//! `eip155:137/slip44:966` for a native coin or
//! `eip155:1/erc20:0xa0b8…eb48` for a token contract. Token references are
//! lowercased hex addresses so string equality is identity.

use alloy_primitives::Address;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

/// Namespace for EVM chains
pub const EIP155_NAMESPACE: &str = "eip155";

/// Kind of asset an [`AssetId`] names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetKind {
    /// Native coin, referenced by SLIP-44 coin type
    Slip44,
    /// Fungible token contract
    Erc20,
    /// Non-fungible token contract
    Erc721,
    /// Multi-token contract
    Erc1155,
}

impl AssetKind {
    fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Slip44 => "slip44",
            AssetKind::Erc20 => "erc20",
            AssetKind::Erc721 => "erc721",
            AssetKind::Erc1155 => "erc1155",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slip44" => Ok(AssetKind::Slip44),
            "erc20" => Ok(AssetKind::Erc20),
            "erc721" => Ok(AssetKind::Erc721),
            "erc1155" => Ok(AssetKind::Erc1155),
            other => Err(CoreError::invalid(format!("unknown asset type: {other:?}"))),
        }
    }
}

/// Chain-and-type-scoped asset identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId {
    /// Chain namespace (`eip155` for EVM chains)
    pub namespace: String,
    /// Chain id within the namespace
    pub chain_id: u64,
    /// Asset type discriminator
    pub kind: AssetKind,
    /// SLIP-44 coin type (native) or lowercased contract address (tokens)
    pub reference: String,
}

impl AssetId {
    /// Native coin of an EVM chain, referenced by SLIP-44 coin type
    pub fn native(chain_id: u64, slip44: u32) -> Self {
        AssetId {
            namespace: EIP155_NAMESPACE.to_string(),
            chain_id,
            kind: AssetKind::Slip44,
            reference: slip44.to_string(),
        }
    }

    /// Token contract asset on an EVM chain
    pub fn token(chain_id: u64, kind: AssetKind, address: Address) -> Self {
        AssetId {
            namespace: EIP155_NAMESPACE.to_string(),
            chain_id,
            kind,
            reference: format!("{address:#x}"),
        }
    }

    /// Contract address for token assets, `None` for native coins
    pub fn address(&self) -> Option<Address> {
        match self.kind {
            AssetKind::Slip44 => None,
            _ => Address::from_str(&self.reference).ok(),
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}/{}:{}",
            self.namespace, self.chain_id, self.kind, self.reference
        )
    }
}

impl FromStr for AssetId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CoreError::invalid(format!("malformed asset id: {s:?}"));
        let (chain_part, asset_part) = s.split_once('/').ok_or_else(malformed)?;
        let (namespace, chain_id) = chain_part.split_once(':').ok_or_else(malformed)?;
        let (kind, reference) = asset_part.split_once(':').ok_or_else(malformed)?;
        if namespace.is_empty() || reference.is_empty() {
            return Err(malformed());
        }
        Ok(AssetId {
            namespace: namespace.to_string(),
            chain_id: chain_id.parse().map_err(|_| malformed())?,
            kind: kind.parse()?,
            reference: reference.to_lowercase(),
        })
    }
}

impl Serialize for AssetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        AssetId::from_str(&s).map_err(de::Error::custom)
    }
}
