//! Test data builders

use alloy_primitives::{Address, Bytes, U256};
use chrono::Utc;

use warden_core::{
    Amount, ComparisonOperator, Credential, EntitySnapshot, OrgId, RequestPayload, SignatureAlg,
    SignatureEnvelope, TransactionRequest, User, UserId, UserRole, Wallet, WalletId,
};
use warden_engine::AuthorizationRequest;
use warden_policy::{
    ApprovalEntities, ApprovalRequirement, Criterion, Policy, PolicyEffect, SpendingFilters,
    TimeWindow, WindowType,
};

/// Builder for directory snapshots
#[derive(Default)]
pub struct SnapshotBuilder {
    snapshot: EntitySnapshot,
}

impl SnapshotBuilder {
    /// Empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user with a credential under `pub_key`
    pub fn user(mut self, role: UserRole, pub_key: &str) -> (Self, UserId) {
        let id = UserId::new();
        self.snapshot.users.insert(id, User { id, role });
        self.snapshot.credentials.insert(
            pub_key.to_string(),
            Credential {
                pub_key: pub_key.to_string(),
                user_id: id,
            },
        );
        (self, id)
    }

    /// Add a wallet at `address`
    pub fn wallet(mut self, address: Address, owner: Option<UserId>) -> (Self, WalletId) {
        let id = WalletId::new();
        self.snapshot.wallets.insert(
            id,
            Wallet {
                id,
                address,
                owner,
            },
        );
        (self, id)
    }

    /// Finish
    pub fn build(self) -> EntitySnapshot {
        self.snapshot
    }
}

/// Approval envelope for the credential registered under `pub_key`
pub fn approval(pub_key: &str) -> SignatureEnvelope {
    SignatureEnvelope {
        sig: "00".to_string(),
        pub_key: pub_key.to_string(),
        alg: SignatureAlg::Eip191,
    }
}

/// Payload moving native value with empty calldata
pub fn native_transfer_payload(
    chain_id: u64,
    from: Address,
    to: Address,
    value: Amount,
) -> RequestPayload {
    RequestPayload::SignTransaction {
        transaction: TransactionRequest {
            from,
            to: Some(to),
            chain_id,
            value: Some(value),
            data: None,
            nonce: None,
            gas: None,
        },
    }
}

/// ERC-20 `transfer(address,uint256)` calldata
pub fn erc20_transfer_calldata(to: Address, amount: U256) -> Bytes {
    let mut data = Vec::with_capacity(4 + 64);
    data.extend_from_slice(&[0xa9, 0x05, 0x9c, 0xbb]);
    data.extend_from_slice(to.into_word().as_slice());
    data.extend_from_slice(&amount.to_be_bytes::<32>());
    Bytes::from(data)
}

/// Payload calling `transfer` on an ERC-20 token contract
pub fn erc20_transfer_payload(
    chain_id: u64,
    from: Address,
    token: Address,
    to: Address,
    amount: U256,
) -> RequestPayload {
    RequestPayload::SignTransaction {
        transaction: TransactionRequest {
            from,
            to: Some(token),
            chain_id,
            value: None,
            data: Some(erc20_transfer_calldata(to, amount)),
            nonce: None,
            gas: None,
        },
    }
}

/// Request in `Created` status wrapping the given payload
pub fn authorization_request(
    org_id: OrgId,
    principal: UserId,
    wallet_id: WalletId,
    payload: RequestPayload,
    nonce: &str,
) -> AuthorizationRequest {
    AuthorizationRequest::new(org_id, principal, wallet_id, payload, nonce, None, Utc::now())
        .unwrap()
}

/// Permit policy gated on the intent amount
pub fn amount_gate(effect: PolicyEffect, operator: ComparisonOperator, value: Amount) -> Policy {
    Policy {
        id: warden_core::PolicyId::new(),
        name: "amount gate".to_string(),
        when: vec![Criterion::CheckIntentAmount {
            currency: "*".to_string(),
            operator,
            value,
        }],
        then: effect,
    }
}

/// Permit policy requiring `count` approvals from the named users
pub fn approval_quorum(count: u32, approvers: Vec<UserId>) -> Policy {
    Policy {
        id: warden_core::PolicyId::new(),
        name: format!("{count}-of-{} approvals", approvers.len()),
        when: vec![Criterion::CheckApprovals(ApprovalRequirement {
            approval_count: count,
            count_principal: false,
            entities: ApprovalEntities::User {
                entity_ids: approvers,
            },
        })],
        then: PolicyEffect::Permit,
    }
}

/// Forbid policy tripping when rolling-window spending exceeds `limit`
pub fn spending_cap(limit: Amount, window_seconds: u64) -> Policy {
    Policy {
        id: warden_core::PolicyId::new(),
        name: "spending cap".to_string(),
        when: vec![Criterion::CheckSpendingLimit {
            limit,
            operator: ComparisonOperator::Gt,
            time_window: TimeWindow {
                window_type: WindowType::Rolling,
                value: window_seconds,
            },
            filters: SpendingFilters::default(),
        }],
        then: PolicyEffect::Forbid,
    }
}

/// Permit policy rejecting replayed nonces
pub fn fresh_nonce_gate() -> Policy {
    Policy {
        id: warden_core::PolicyId::new(),
        name: "fresh nonce".to_string(),
        when: vec![Criterion::CheckNonceExists],
        then: PolicyEffect::Permit,
    }
}
