//! Transaction intent decoder
//!
//! Classifies a raw transaction request into a semantic [`Intent`]: native
//! transfer, token transfer (ERC-20/721/1155), uninterpreted contract call,
//! or unknown. Decoding is a pure function over the chain registry and the
//! request; it never executes or simulates anything.

pub mod abi;
pub mod decode;
pub mod error;
pub mod intent;
pub mod selectors;

pub use decode::decode;
pub use error::{DecodeError, DecodeResult};
pub use intent::{Erc1155Transfer, Intent, IntentType};
