//! Approval quorum accounting
//!
//! Counts distinct qualifying approvers against a requirement. Each submitted
//! approval resolves through the directory snapshot: public key → credential
//! → user. Approvers are deduplicated by user identity; the requesting
//! principal is excluded unless the requirement says otherwise. The outcome
//! reports both who satisfied the requirement and who is still missing, so
//! evaluation reasons can explain "why" to the human awaiting approval.

use std::collections::BTreeSet;

use warden_core::UserId;

use crate::context::EvaluationContext;
use crate::criterion::{ApprovalEntities, ApprovalRequirement};
use crate::error::{EvalError, EvalResult};

/// Result of counting approvals against one requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalOutcome {
    /// Whether the quorum is met
    pub met: bool,
    /// Required count
    pub required: u32,
    /// Qualifying approvers, deduplicated, sorted for determinism
    pub satisfied: Vec<UserId>,
    /// Qualifying entities that have not approved yet, sorted
    pub missing: Vec<UserId>,
}

/// Count approvals against a requirement
pub fn check_approvals(
    requirement: &ApprovalRequirement,
    ctx: &EvaluationContext,
) -> EvalResult<ApprovalOutcome> {
    // Resolve every submitted approval to a user. An unresolvable key is
    // malformed context, not a "false" outcome.
    let mut approvers: BTreeSet<UserId> = BTreeSet::new();
    for approval in &ctx.approvals {
        let user = ctx
            .entities
            .user_by_pub_key(&approval.pub_key)
            .ok_or_else(|| EvalError::UnresolvableCredential {
                pub_key: approval.pub_key.clone(),
            })?;
        approvers.insert(user.id);
    }

    if !requirement.count_principal {
        approvers.remove(&ctx.principal);
    }

    let eligible: BTreeSet<UserId> = match &requirement.entities {
        ApprovalEntities::User { entity_ids } => entity_ids.iter().copied().collect(),
        ApprovalEntities::UserRole { entity_ids } => entity_ids
            .iter()
            .flat_map(|role| ctx.entities.users_with_role(*role))
            .map(|user| user.id)
            .collect(),
    };

    let satisfied: Vec<UserId> = approvers.intersection(&eligible).copied().collect();
    let mut missing: Vec<UserId> = eligible
        .iter()
        .filter(|id| !approvers.contains(id))
        .copied()
        .collect();
    if !requirement.count_principal {
        missing.retain(|id| *id != ctx.principal);
    }

    Ok(ApprovalOutcome {
        met: satisfied.len() as u32 >= requirement.approval_count,
        required: requirement.approval_count,
        satisfied,
        missing,
    })
}
