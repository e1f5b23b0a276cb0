//! Arbitrary-precision token and fiat amounts
//!
//! All value arithmetic in the engine runs on 256-bit integers. Amounts are
//! serialized as decimal strings so canonical hashing never depends on a JSON
//! parser's numeric range, and no floating-point value ever enters a
//! comparison.

use alloy_primitives::{U256, U512};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

/// Scale factor for fiat prices: one price unit is 1e-18 of the quote
/// currency per token base unit.
pub const PRICE_SCALE: u64 = 1_000_000_000_000_000_000;

/// A non-negative amount in base units (wei-like) or 1e18-scaled fiat units
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(pub U256);

impl Amount {
    /// The zero amount
    pub const ZERO: Amount = Amount(U256::ZERO);

    /// Construct from a u64
    pub fn from_u64(value: u64) -> Self {
        Amount(U256::from(value))
    }

    /// Parse a decimal string
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        // from_str_radix reads the empty string as zero; an absent amount on
        // the wire must not silently become 0.
        if s.is_empty() {
            return Err(CoreError::invalid("not a decimal amount: \"\""));
        }
        let inner = U256::from_str_radix(s, 10)
            .map_err(|_| CoreError::invalid(format!("not a decimal amount: {s:?}")))?;
        Ok(Amount(inner))
    }

    /// Checked addition; `None` signals 256-bit overflow
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Convert a token amount in base units to a 1e18-scaled fiat value,
    /// given a 1e18-scaled price per base unit.
    ///
    /// The multiply runs in 512 bits so the intermediate product cannot
    /// overflow; the result must still fit in 256 bits.
    pub fn convert(self, price_per_base_unit: Amount) -> Result<Amount, CoreError> {
        let product = U512::from(self.0) * U512::from(price_per_base_unit.0);
        let scaled = product / U512::from(PRICE_SCALE);
        if scaled.bit_len() > 256 {
            return Err(CoreError::invalid("converted amount overflow"));
        }
        Ok(Amount(scaled.to::<U256>()))
    }

    /// Compare two amounts with the given operator
    pub fn compare(self, operator: ComparisonOperator, other: Amount) -> bool {
        match operator {
            ComparisonOperator::Lt => self.0 < other.0,
            ComparisonOperator::Lte => self.0 <= other.0,
            ComparisonOperator::Gt => self.0 > other.0,
            ComparisonOperator::Gte => self.0 >= other.0,
            ComparisonOperator::Eq => self.0 == other.0,
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse(s)
    }
}

impl From<U256> for Amount {
    fn from(value: U256) -> Self {
        Amount(value)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount::from_u64(value)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Amount::parse(&s).map_err(de::Error::custom)
    }
}

/// Comparison operator used by amount and spending-limit criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    /// Strictly less than
    Lt,
    /// Less than or equal
    Lte,
    /// Strictly greater than
    Gt,
    /// Greater than or equal
    Gte,
    /// Equal
    Eq,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_serializes_decimal_strings() {
        let amount = Amount::parse("1500000000000000000").unwrap();
        assert_eq!(amount.to_string(), "1500000000000000000");
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"1500000000000000000\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }

    #[test]
    fn rejects_non_decimal_input() {
        assert!(Amount::parse("0x10").is_err());
        assert!(Amount::parse("-5").is_err());
        assert!(Amount::parse("").is_err());
    }

    #[test]
    fn comparison_operators() {
        let one = Amount::from_u64(1);
        let two = Amount::from_u64(2);
        assert!(one.compare(ComparisonOperator::Lt, two));
        assert!(one.compare(ComparisonOperator::Lte, one));
        assert!(two.compare(ComparisonOperator::Gt, one));
        assert!(two.compare(ComparisonOperator::Gte, two));
        assert!(one.compare(ComparisonOperator::Eq, one));
        assert!(!one.compare(ComparisonOperator::Eq, two));
    }

    #[test]
    fn fiat_conversion_is_integer_fixed_point() {
        // 2e18 base units at a price of 3 (1e18-scaled) per base unit
        let amount = Amount::parse("2000000000000000000").unwrap();
        let price = Amount::parse("3000000000000000000").unwrap();
        let converted = amount.convert(price).unwrap();
        assert_eq!(converted.to_string(), "6000000000000000000");
    }

    #[test]
    fn fiat_conversion_overflow_is_rejected() {
        // MAX * MAX / 1e18 cannot fit back into 256 bits.
        let max = Amount(U256::MAX);
        assert!(max.convert(max).is_err());
        // The widened intermediate keeps MAX * scale-sized prices exact.
        let scale = Amount::from_u64(PRICE_SCALE);
        assert_eq!(max.convert(scale).unwrap(), max);
    }
}
