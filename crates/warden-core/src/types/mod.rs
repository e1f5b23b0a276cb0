//! Shared type definitions

pub mod identifiers;
pub mod request;

pub use identifiers::{
    NodeId, OrgId, PolicyId, RequestId, UserGroupId, UserId, WalletGroupId, WalletId,
};
pub use request::{Action, RequestPayload, TransactionRequest};
