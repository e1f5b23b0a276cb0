//! Policy resolution
//!
//! Evaluates every policy's criteria against the context and aggregates the
//! per-policy verdicts into one decision. Precedence: any matching Forbid
//! wins; otherwise a Permit blocked only by missing approvals yields Confirm;
//! otherwise a fully matching Permit yields Permit; otherwise default deny.
//! The resolver is pure given its inputs; the response is signed by the
//! signing collaborator before it is returned.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use warden_core::{hash, PolicyId, SignatureEnvelope, UserId};

use crate::context::EvaluationContext;
use crate::criterion::{Policy, PolicyEffect};
use crate::error::{EvalError, EvalResult};
use crate::evaluate::{evaluate_criterion, Verdict};
use crate::signer::ResponseSigner;

/// Final decision of one evaluation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// The request may be signed
    Permit,
    /// The request is denied
    Forbid,
    /// More approvals are required before the request can be permitted
    Confirm,
}

/// One policy that participated in the decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedRule {
    /// The policy
    pub policy_id: PolicyId,
    /// Policy name at evaluation time
    pub name: String,
    /// The policy's effect
    pub effect: PolicyEffect,
    /// Approvers that satisfied the policy's approval criteria
    pub approvals_satisfied: Vec<UserId>,
    /// Qualifying approvers still missing
    pub approvals_missing: Vec<UserId>,
}

/// Unsigned outcome of the pure resolution step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDecision {
    /// The decision
    pub decision: Decision,
    /// Policies that produced it
    pub reasons: Vec<MatchedRule>,
    /// Evaluator raises downgraded to "not satisfied", for the audit trail
    pub diagnostics: Vec<String>,
}

/// Signed evaluation response, appended to the request's evaluation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResponse {
    /// The decision
    pub decision: Decision,
    /// Policies that produced it
    pub reasons: Vec<MatchedRule>,
    /// Engine signature over `{decision, reasons}` in canonical JSON
    pub signature: SignatureEnvelope,
}

struct PolicyOutcome {
    rule: MatchedRule,
    effect: PolicyEffect,
    fully_matched: bool,
    blocked_on_approvals: bool,
}

/// Resolve the active policy set against one evaluation context
pub fn resolve(policies: &[Policy], ctx: &EvaluationContext) -> ResolvedDecision {
    let mut diagnostics = Vec::new();
    let outcomes: Vec<PolicyOutcome> = policies
        .iter()
        .map(|policy| evaluate_policy(policy, ctx, &mut diagnostics))
        .collect();

    let forbids: Vec<&PolicyOutcome> = outcomes
        .iter()
        .filter(|o| o.effect == PolicyEffect::Forbid && o.fully_matched)
        .collect();
    if !forbids.is_empty() {
        // Any one forbid is sufficient; all are reported.
        return ResolvedDecision {
            decision: Decision::Forbid,
            reasons: forbids.into_iter().map(|o| o.rule.clone()).collect(),
            diagnostics,
        };
    }

    let pending: Vec<&PolicyOutcome> = outcomes
        .iter()
        .filter(|o| o.effect == PolicyEffect::Permit && o.blocked_on_approvals)
        .collect();
    if !pending.is_empty() {
        return ResolvedDecision {
            decision: Decision::Confirm,
            reasons: pending.into_iter().map(|o| o.rule.clone()).collect(),
            diagnostics,
        };
    }

    let permits: Vec<&PolicyOutcome> = outcomes
        .iter()
        .filter(|o| o.effect == PolicyEffect::Permit && o.fully_matched)
        .collect();
    if !permits.is_empty() {
        return ResolvedDecision {
            decision: Decision::Permit,
            reasons: permits.into_iter().map(|o| o.rule.clone()).collect(),
            diagnostics,
        };
    }

    // Default deny: no policy matched at all.
    debug!("no policy matched, default deny");
    ResolvedDecision {
        decision: Decision::Forbid,
        reasons: Vec::new(),
        diagnostics,
    }
}

fn evaluate_policy(
    policy: &Policy,
    ctx: &EvaluationContext,
    diagnostics: &mut Vec<String>,
) -> PolicyOutcome {
    let mut hard_failure = false;
    let mut approvals_met = true;
    let mut approvals_satisfied = Vec::new();
    let mut approvals_missing = Vec::new();

    for criterion in &policy.when {
        match evaluate_criterion(criterion, ctx) {
            Ok(Verdict::Satisfied) => {}
            Ok(Verdict::NotSatisfied) => hard_failure = true,
            Ok(Verdict::Approvals(outcome)) => {
                if !outcome.met {
                    // Confirm is only for quorums additional signatures can
                    // still reach. A requirement whose eligible set is
                    // smaller than its count is a plain mismatch; otherwise
                    // the request would sit in Confirm forever.
                    let reachable = outcome.satisfied.len() + outcome.missing.len();
                    if reachable < outcome.required as usize {
                        hard_failure = true;
                    } else {
                        approvals_met = false;
                    }
                }
                approvals_satisfied.extend(outcome.satisfied);
                approvals_missing.extend(outcome.missing);
            }
            Err(error) => {
                // A raise is malformed context, never a crash: the criterion
                // counts as not satisfied and the raise is kept as a
                // diagnostic.
                warn!(policy = %policy.id, %error, "criterion raised, treated as not satisfied");
                diagnostics.push(format!("policy {}: {error}", policy.id));
                hard_failure = true;
            }
        }
    }

    approvals_satisfied.sort();
    approvals_satisfied.dedup();
    approvals_missing.sort();
    approvals_missing.dedup();

    PolicyOutcome {
        rule: MatchedRule {
            policy_id: policy.id,
            name: policy.name.clone(),
            effect: policy.then,
            approvals_satisfied,
            approvals_missing,
        },
        effect: policy.then,
        fully_matched: !hard_failure && approvals_met,
        blocked_on_approvals: !hard_failure && !approvals_met,
    }
}

/// Payload the response signature covers
#[derive(Serialize)]
struct SignedPortion<'a> {
    decision: Decision,
    reasons: &'a [MatchedRule],
}

/// Sign a resolved decision
pub async fn sign_decision(
    resolved: &ResolvedDecision,
    signer: &dyn ResponseSigner,
) -> EvalResult<EvaluationResponse> {
    let payload = hash::canonical_json(&SignedPortion {
        decision: resolved.decision,
        reasons: &resolved.reasons,
    })
    .map_err(|e| EvalError::signing(e.to_string()))?;
    let signature = signer.sign(payload.as_bytes()).await?;
    Ok(EvaluationResponse {
        decision: resolved.decision,
        reasons: resolved.reasons.clone(),
        signature,
    })
}

/// Resolve and sign in one step
pub async fn resolve_and_sign(
    policies: &[Policy],
    ctx: &EvaluationContext,
    signer: &dyn ResponseSigner,
) -> EvalResult<EvaluationResponse> {
    let resolved = resolve(policies, ctx);
    sign_decision(&resolved, signer).await
}
