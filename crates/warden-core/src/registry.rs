//! Chain registry
//!
//! Static mapping from chain id to native-asset metadata. Constructed once at
//! bootstrap and passed by handle into the decoder; there is no module-level
//! registry state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::asset::AssetId;
use crate::errors::{CoreError, CoreResult};

/// Metadata for one supported chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainMetadata {
    /// EIP-155 chain id
    pub chain_id: u64,
    /// Human-readable chain name
    pub name: String,
    /// Native coin ticker
    pub symbol: String,
    /// Native coin decimals
    pub decimals: u8,
    /// SLIP-44 coin type of the native coin
    pub slip44: u32,
}

/// Registry of supported chains
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: HashMap<u64, ChainMetadata>,
}

impl ChainRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the EVM mainnets the engine supports out of
    /// the box
    pub fn with_default_chains() -> Self {
        let mut registry = Self::new();
        for (chain_id, name, symbol, slip44) in [
            (1u64, "Ethereum", "ETH", 60u32),
            (10, "Optimism", "ETH", 614),
            (56, "BNB Smart Chain", "BNB", 714),
            (137, "Polygon", "POL", 966),
            (42161, "Arbitrum One", "ETH", 9001),
            (43114, "Avalanche C-Chain", "AVAX", 9000),
        ] {
            registry.register(ChainMetadata {
                chain_id,
                name: name.to_string(),
                symbol: symbol.to_string(),
                decimals: 18,
                slip44,
            });
        }
        registry
    }

    /// Add or replace a chain entry
    pub fn register(&mut self, metadata: ChainMetadata) {
        self.chains.insert(metadata.chain_id, metadata);
    }

    /// Look up a chain by id
    pub fn chain(&self, chain_id: u64) -> Option<&ChainMetadata> {
        self.chains.get(&chain_id)
    }

    /// Native asset id for a chain, or an error for unknown chains
    pub fn native_asset(&self, chain_id: u64) -> CoreResult<AssetId> {
        let metadata = self
            .chain(chain_id)
            .ok_or_else(|| CoreError::not_found(format!("chain {chain_id} not registered")))?;
        Ok(AssetId::native(chain_id, metadata.slip44))
    }

    /// Ids of all registered chains
    pub fn chain_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.chains.keys().copied()
    }
}
