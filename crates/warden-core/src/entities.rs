//! Organizational directory snapshot
//!
//! The entity snapshot is fetched fresh per evaluation and treated as
//! immutable for its duration. It resolves approval public keys to users,
//! users to roles and groups, and wallets to owners and groups.

use std::collections::HashMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::types::identifiers::{UserGroupId, UserId, WalletGroupId, WalletId};

/// Role a user holds within the organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Organization root
    Root,
    /// Administrator
    Admin,
    /// Manager
    Manager,
    /// Regular member
    Member,
}

/// A user in the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub id: UserId,
    /// Role held by the user
    pub role: UserRole,
}

/// A group of users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroup {
    /// Group identifier
    pub id: UserGroupId,
    /// Member user ids
    pub users: Vec<UserId>,
}

/// A wallet the organization controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Wallet identifier
    pub id: WalletId,
    /// On-chain address
    pub address: Address,
    /// Owning user, when assigned
    pub owner: Option<UserId>,
}

/// A group of wallets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletGroup {
    /// Group identifier
    pub id: WalletGroupId,
    /// Member wallet ids
    pub wallets: Vec<WalletId>,
}

/// Classification of a known counterparty address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressClassification {
    /// Organization-controlled wallet
    Internal,
    /// Externally owned but organization-managed
    Managed,
    /// Known external counterparty
    External,
}

/// Address-book entry for a counterparty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBookEntry {
    /// Chain the entry applies to
    pub chain_id: u64,
    /// Counterparty address
    pub address: Address,
    /// Classification used by destination criteria
    pub classification: AddressClassification,
}

/// A credential binding a public key to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Hex-encoded public key
    pub pub_key: String,
    /// User the key belongs to
    pub user_id: UserId,
}

/// Read-only snapshot of the organizational directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Users by id
    pub users: HashMap<UserId, User>,
    /// User groups by id
    pub user_groups: HashMap<UserGroupId, UserGroup>,
    /// Wallets by id
    pub wallets: HashMap<WalletId, Wallet>,
    /// Wallet groups by id
    pub wallet_groups: HashMap<WalletGroupId, WalletGroup>,
    /// Known counterparty addresses
    pub address_book: Vec<AddressBookEntry>,
    /// Credentials by hex-encoded public key
    pub credentials: HashMap<String, Credential>,
}

impl EntitySnapshot {
    /// Resolve a public key to the user holding it
    pub fn user_by_pub_key(&self, pub_key: &str) -> Option<&User> {
        let credential = self.credentials.get(pub_key)?;
        self.users.get(&credential.user_id)
    }

    /// All users holding a given role
    pub fn users_with_role(&self, role: UserRole) -> impl Iterator<Item = &User> {
        self.users.values().filter(move |user| user.role == role)
    }

    /// Groups a user belongs to
    pub fn groups_of_user(&self, user_id: UserId) -> impl Iterator<Item = UserGroupId> + '_ {
        self.user_groups
            .values()
            .filter(move |group| group.users.contains(&user_id))
            .map(|group| group.id)
    }

    /// Groups a wallet belongs to
    pub fn groups_of_wallet(&self, wallet_id: WalletId) -> impl Iterator<Item = WalletGroupId> + '_ {
        self.wallet_groups
            .values()
            .filter(move |group| group.wallets.contains(&wallet_id))
            .map(|group| group.id)
    }

    /// Address-book classification for a counterparty, if known
    pub fn classify_address(
        &self,
        chain_id: u64,
        address: Address,
    ) -> Option<AddressClassification> {
        self.address_book
            .iter()
            .find(|entry| entry.chain_id == chain_id && entry.address == address)
            .map(|entry| entry.classification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_user(role: UserRole) -> (EntitySnapshot, UserId, String) {
        let user_id = UserId::new();
        let pub_key = "02abcdef".to_string();
        let mut snapshot = EntitySnapshot::default();
        snapshot.users.insert(user_id, User { id: user_id, role });
        snapshot.credentials.insert(
            pub_key.clone(),
            Credential {
                pub_key: pub_key.clone(),
                user_id,
            },
        );
        (snapshot, user_id, pub_key)
    }

    #[test]
    fn resolves_pub_key_to_user() {
        let (snapshot, user_id, pub_key) = snapshot_with_user(UserRole::Admin);
        let user = snapshot.user_by_pub_key(&pub_key).unwrap();
        assert_eq!(user.id, user_id);
        assert_eq!(user.role, UserRole::Admin);
    }

    #[test]
    fn unknown_pub_key_resolves_to_none() {
        let (snapshot, _, _) = snapshot_with_user(UserRole::Member);
        assert!(snapshot.user_by_pub_key("deadbeef").is_none());
    }
}
