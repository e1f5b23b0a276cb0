//! Core identifier types used across the Warden engine
//!
//! Every entity that crosses a crate boundary is named by a uuid-backed
//! newtype so ids of different kinds cannot be confused.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random id
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create from a UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            pub fn uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id!(
    /// Organization identifier
    ///
    /// Every authorization request, wallet, and directory entry belongs to
    /// exactly one organization.
    OrgId,
    "org"
);

uuid_id!(
    /// Authorization request identifier
    ///
    /// Doubles as the job-dedup key at the queue layer, so at most one
    /// evaluation per request is ever in flight.
    RequestId,
    "request"
);

uuid_id!(
    /// User identifier within the organizational directory
    UserId,
    "user"
);

uuid_id!(
    /// Wallet identifier (the resource a request targets)
    WalletId,
    "wallet"
);

uuid_id!(
    /// User group identifier
    UserGroupId,
    "user-group"
);

uuid_id!(
    /// Wallet group identifier
    WalletGroupId,
    "wallet-group"
);

uuid_id!(
    /// Policy identifier
    PolicyId,
    "policy"
);

uuid_id!(
    /// Evaluation-engine node identifier, used by consensus reconciliation
    NodeId,
    "node"
);
