//! Historical transfers and price data consumed as feed payloads

use std::collections::HashMap;

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::asset::AssetId;
use crate::types::identifiers::{OrgId, UserId, WalletId};

/// Fiat quote currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FiatCurrency {
    /// United States dollar
    Usd,
    /// Euro
    Eur,
}

/// One historical transfer, as reported by the transfer-history feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Organization the transfer belongs to
    pub org_id: OrgId,
    /// Wallet the transfer was initiated from
    pub wallet_id: WalletId,
    /// Sender address
    pub from: Address,
    /// Recipient address
    pub to: Address,
    /// Asset that moved
    pub token: AssetId,
    /// Amount in base units
    pub amount: Amount,
    /// User who initiated the transfer
    pub initiated_by: UserId,
    /// When the transfer was recorded
    pub created_at: DateTime<Utc>,
}

/// Prices for a set of assets in one or more fiat currencies
///
/// Each price is a 1e18-scaled integer fiat value per token base unit, so
/// amount conversion stays in integer arithmetic (see [`Amount::convert`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSheet {
    /// Prices keyed by asset, then quote currency
    pub prices: HashMap<AssetId, HashMap<FiatCurrency, Amount>>,
}

impl PriceSheet {
    /// Price of one base unit of `asset` in `currency`, 1e18-scaled
    pub fn price(&self, asset: &AssetId, currency: FiatCurrency) -> Option<Amount> {
        self.prices.get(asset)?.get(&currency).copied()
    }

    /// Add a price entry
    pub fn set_price(&mut self, asset: AssetId, currency: FiatCurrency, price: Amount) {
        self.prices.entry(asset).or_default().insert(currency, price);
    }
}
