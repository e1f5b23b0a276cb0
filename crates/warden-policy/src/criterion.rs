//! Policies and criteria
//!
//! A policy is `when: [Criterion], then: Permit | Forbid`; criteria are
//! AND-combined and carry pure data only. Evaluators dispatch on the variant
//! tag; the set of variants is closed.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use warden_core::{
    Action, AddressClassification, Amount, AssetId, ComparisonOperator, PolicyId, UserGroupId,
    UserId, UserRole, WalletGroupId, WalletId,
};
use warden_decoder::IntentType;

/// Outcome a policy produces when all of its criteria are satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyEffect {
    /// Allow the request
    Permit,
    /// Deny the request
    Forbid,
}

/// One declarative policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Policy identifier
    pub id: PolicyId,
    /// Human-readable name, carried into evaluation reasons
    pub name: String,
    /// AND-combined criteria
    pub when: Vec<Criterion>,
    /// Effect when all criteria match
    pub then: PolicyEffect,
}

/// Which entity kind approvals are counted against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "approval_entity_type", rename_all = "snake_case")]
pub enum ApprovalEntities {
    /// Count distinct named users
    User {
        /// Users whose approvals qualify
        entity_ids: Vec<UserId>,
    },
    /// Count distinct users holding any of the named roles
    UserRole {
        /// Qualifying roles
        entity_ids: Vec<UserRole>,
    },
}

/// An approval quorum requirement
///
/// Also the shape of the satisfied/missing sets reported in evaluation
/// reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequirement {
    /// Minimum count of distinct qualifying approvers
    pub approval_count: u32,
    /// Whether the requesting principal's own approval counts
    pub count_principal: bool,
    /// Entity kind and qualifying identities
    #[serde(flatten)]
    pub entities: ApprovalEntities,
}

/// Window type for spending limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    /// Fixed duration ending at evaluation time, recomputed on each call
    Rolling,
}

/// Time window for spending-limit aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Window type
    #[serde(rename = "type")]
    pub window_type: WindowType,
    /// Window length in seconds
    pub value: u64,
}

/// Filters restricting which transfers count toward a spending limit
///
/// An empty filter list matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingFilters {
    /// Restrict to these assets
    #[serde(default)]
    pub tokens: Vec<AssetId>,
    /// Restrict to transfers initiated by these users
    #[serde(default)]
    pub users: Vec<UserId>,
    /// Restrict to transfers from these wallets
    #[serde(default)]
    pub wallets: Vec<WalletId>,
}

/// One predicate inside a policy's `when` clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "criterion", rename_all = "snake_case")]
pub enum Criterion {
    /// Action is one of the listed actions
    CheckAction {
        /// Qualifying actions
        actions: Vec<Action>,
    },
    /// Requesting principal is one of the listed users
    CheckPrincipalId {
        /// Qualifying users
        principals: Vec<UserId>,
    },
    /// Requesting principal holds one of the listed roles
    CheckPrincipalRole {
        /// Qualifying roles
        roles: Vec<UserRole>,
    },
    /// Requesting principal belongs to one of the listed groups
    CheckPrincipalGroup {
        /// Qualifying groups
        groups: Vec<UserGroupId>,
    },
    /// Target wallet is one of the listed wallets
    CheckWalletId {
        /// Qualifying wallets
        wallets: Vec<WalletId>,
    },
    /// Target wallet address is one of the listed addresses
    CheckWalletAddress {
        /// Qualifying addresses
        addresses: Vec<Address>,
    },
    /// Target wallet belongs to one of the listed groups
    CheckWalletGroup {
        /// Qualifying groups
        groups: Vec<WalletGroupId>,
    },
    /// Decoded intent has one of the listed types
    CheckIntentType {
        /// Qualifying intent types
        intent_types: Vec<IntentType>,
    },
    /// Intent moves one of the listed assets
    CheckIntentToken {
        /// Qualifying assets
        tokens: Vec<AssetId>,
    },
    /// Intent targets one of the listed contracts
    CheckIntentContract {
        /// Qualifying contracts
        contracts: Vec<Address>,
    },
    /// Intent destination is one of the listed addresses
    CheckDestinationAddress {
        /// Qualifying addresses
        addresses: Vec<Address>,
    },
    /// Intent destination carries one of the listed address-book
    /// classifications
    CheckDestinationClassification {
        /// Qualifying classifications
        classifications: Vec<AddressClassification>,
    },
    /// Intent amount, converted to `currency`, compares to `value`
    CheckIntentAmount {
        /// Quote currency; `"*"` means native units, no conversion
        currency: String,
        /// Comparison operator
        operator: ComparisonOperator,
        /// Threshold in base units (native) or 1e18-scaled fiat units
        value: Amount,
    },
    /// Approval quorum requirement
    CheckApprovals(ApprovalRequirement),
    /// Rolling-window spending limit
    CheckSpendingLimit {
        /// Limit the aggregated sum is compared against
        limit: Amount,
        /// Comparison operator (`Gt` means "sum exceeds limit")
        operator: ComparisonOperator,
        /// Aggregation window
        time_window: TimeWindow,
        /// Transfer filters
        #[serde(default)]
        filters: SpendingFilters,
    },
    /// Request nonce has not been consumed by a prior permitted request for
    /// the same resource
    CheckNonceExists,
    /// Stored request hash matches the recomputed canonical digest
    CheckResourceIntegrity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criterion_serde_tag_round_trips() {
        let criterion = Criterion::CheckIntentAmount {
            currency: "*".to_string(),
            operator: ComparisonOperator::Lte,
            value: Amount::parse("1000000000000000000").unwrap(),
        };
        let json = serde_json::to_value(&criterion).unwrap();
        assert_eq!(json["criterion"], "check_intent_amount");
        assert_eq!(json["value"], "1000000000000000000");
        let back: Criterion = serde_json::from_value(json).unwrap();
        assert_eq!(back, criterion);
    }

    #[test]
    fn approval_requirement_flattens_entity_type() {
        let requirement = ApprovalRequirement {
            approval_count: 2,
            count_principal: false,
            entities: ApprovalEntities::UserRole {
                entity_ids: vec![UserRole::Admin],
            },
        };
        let json = serde_json::to_value(&requirement).unwrap();
        assert_eq!(json["approval_entity_type"], "user_role");
        assert_eq!(json["entity_ids"][0], "admin");
    }

    #[test]
    fn spending_filters_default_to_empty() {
        let json = serde_json::json!({
            "criterion": "check_spending_limit",
            "limit": "1000",
            "operator": "gt",
            "time_window": {"type": "rolling", "value": 43200},
        });
        let criterion: Criterion = serde_json::from_value(json).unwrap();
        assert_matches::assert_matches!(criterion, Criterion::CheckSpendingLimit { filters, .. } => {
            assert!(filters.tokens.is_empty());
        });
    }
}
