//! Core types for the Warden authorization engine
//!
//! This crate carries everything the decoder, policy, and engine crates
//! share: identifier newtypes, chain-scoped asset identifiers, the chain
//! registry, arbitrary-precision amounts, canonical request hashing,
//! signature/feed envelopes, the organizational directory snapshot, and the
//! historical transfer and price payloads.

pub mod amount;
pub mod asset;
pub mod entities;
pub mod envelope;
pub mod errors;
pub mod hash;
pub mod registry;
pub mod transfer;
pub mod types;

pub use amount::{Amount, ComparisonOperator};
pub use asset::{AssetId, AssetKind};
pub use entities::{
    AddressBookEntry, AddressClassification, Credential, EntitySnapshot, User, UserGroup, UserRole,
    Wallet, WalletGroup,
};
pub use envelope::{Feed, SignatureAlg, SignatureEnvelope};
pub use errors::{CoreError, CoreResult};
pub use registry::{ChainMetadata, ChainRegistry};
pub use transfer::{FiatCurrency, PriceSheet, Transfer};
pub use types::{
    Action, NodeId, OrgId, PolicyId, RequestId, RequestPayload, TransactionRequest, UserGroupId,
    UserId, WalletGroupId, WalletId,
};
