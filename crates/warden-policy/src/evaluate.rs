//! Criterion evaluators
//!
//! One evaluator per criterion variant, dispatched by exhaustive match. A
//! criterion that does not hold is a normal [`Verdict::NotSatisfied`];
//! evaluators raise only on malformed or missing context, and the resolver
//! treats such a raise as "not satisfied" with a diagnostic attached.
//!
//! Intent-based criteria evaluate to NotSatisfied for non-transaction
//! actions: a message-signing request has no intent, and a policy keyed on
//! intents simply does not apply to it.

use warden_core::{hash, Amount, FiatCurrency};

use crate::approvals::{check_approvals, ApprovalOutcome};
use crate::context::EvaluationContext;
use crate::criterion::Criterion;
use crate::error::{EvalError, EvalResult};
use crate::spending::check_spending_limit;

/// Outcome of evaluating one criterion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The criterion holds
    Satisfied,
    /// The criterion does not hold
    NotSatisfied,
    /// Approval accounting result, satisfied or not, with detail for reasons
    Approvals(ApprovalOutcome),
}

impl Verdict {
    /// Whether this verdict counts as satisfied
    pub fn is_satisfied(&self) -> bool {
        match self {
            Verdict::Satisfied => true,
            Verdict::NotSatisfied => false,
            Verdict::Approvals(outcome) => outcome.met,
        }
    }

    fn from_bool(satisfied: bool) -> Self {
        if satisfied {
            Verdict::Satisfied
        } else {
            Verdict::NotSatisfied
        }
    }
}

/// Evaluate one criterion against the context
pub fn evaluate_criterion(criterion: &Criterion, ctx: &EvaluationContext) -> EvalResult<Verdict> {
    let verdict = match criterion {
        Criterion::CheckAction { actions } => Verdict::from_bool(actions.contains(&ctx.action)),

        Criterion::CheckPrincipalId { principals } => {
            Verdict::from_bool(principals.contains(&ctx.principal))
        }

        Criterion::CheckPrincipalRole { roles } => {
            let user = ctx.entities.users.get(&ctx.principal).ok_or_else(|| {
                EvalError::missing_context(format!("principal {} not in snapshot", ctx.principal))
            })?;
            Verdict::from_bool(roles.contains(&user.role))
        }

        Criterion::CheckPrincipalGroup { groups } => {
            let member = ctx
                .entities
                .groups_of_user(ctx.principal)
                .any(|group| groups.contains(&group));
            Verdict::from_bool(member)
        }

        Criterion::CheckWalletId { wallets } => {
            Verdict::from_bool(wallets.contains(&ctx.wallet_id))
        }

        Criterion::CheckWalletAddress { addresses } => {
            let wallet = ctx.entities.wallets.get(&ctx.wallet_id).ok_or_else(|| {
                EvalError::missing_context(format!("wallet {} not in snapshot", ctx.wallet_id))
            })?;
            Verdict::from_bool(addresses.contains(&wallet.address))
        }

        Criterion::CheckWalletGroup { groups } => {
            let member = ctx
                .entities
                .groups_of_wallet(ctx.wallet_id)
                .any(|group| groups.contains(&group));
            Verdict::from_bool(member)
        }

        Criterion::CheckIntentType { intent_types } => Verdict::from_bool(
            ctx.intent
                .as_ref()
                .is_some_and(|intent| intent_types.contains(&intent.intent_type())),
        ),

        Criterion::CheckIntentToken { tokens } => Verdict::from_bool(
            ctx.intent
                .as_ref()
                .and_then(|intent| intent.token())
                .is_some_and(|token| tokens.contains(token)),
        ),

        Criterion::CheckIntentContract { contracts } => Verdict::from_bool(
            ctx.intent
                .as_ref()
                .and_then(|intent| intent.contract())
                .is_some_and(|contract| contracts.contains(&contract)),
        ),

        Criterion::CheckDestinationAddress { addresses } => Verdict::from_bool(
            ctx.intent
                .as_ref()
                .and_then(|intent| intent.destination())
                .is_some_and(|destination| addresses.contains(&destination)),
        ),

        Criterion::CheckDestinationClassification { classifications } => {
            let classification = ctx.intent.as_ref().and_then(|intent| {
                let destination = intent.destination()?;
                let chain_id = ctx.chain_id()?;
                ctx.entities.classify_address(chain_id, destination)
            });
            Verdict::from_bool(
                classification.is_some_and(|class| classifications.contains(&class)),
            )
        }

        Criterion::CheckIntentAmount {
            currency,
            operator,
            value,
        } => {
            let Some(intent) = ctx.intent.as_ref() else {
                return Ok(Verdict::NotSatisfied);
            };
            let Some(amount) = intent.amount() else {
                return Ok(Verdict::NotSatisfied);
            };
            let effective = convert_amount(amount, currency, intent, ctx)?;
            Verdict::from_bool(effective.compare(*operator, *value))
        }

        Criterion::CheckApprovals(requirement) => {
            Verdict::Approvals(check_approvals(requirement, ctx)?)
        }

        Criterion::CheckSpendingLimit {
            limit,
            operator,
            time_window,
            filters,
        } => Verdict::from_bool(check_spending_limit(
            *limit,
            *operator,
            *time_window,
            filters,
            ctx,
        )?),

        Criterion::CheckNonceExists => {
            Verdict::from_bool(!ctx.consumed_nonces.contains(&ctx.nonce))
        }

        Criterion::CheckResourceIntegrity => {
            let digest = hash::digest_hex(&ctx.payload)
                .map_err(|e| EvalError::missing_context(format!("payload digest failed: {e}")))?;
            Verdict::from_bool(digest == ctx.request_hash)
        }
    };
    Ok(verdict)
}

/// Convert an intent amount to the criterion's currency
///
/// `"*"` means native units, no conversion. Anything else must name a fiat
/// currency present in the price feed for the intent's asset.
fn convert_amount(
    amount: Amount,
    currency: &str,
    intent: &warden_decoder::Intent,
    ctx: &EvaluationContext,
) -> EvalResult<Amount> {
    if currency == "*" {
        return Ok(amount);
    }
    let fiat = match currency {
        "usd" => FiatCurrency::Usd,
        "eur" => FiatCurrency::Eur,
        other => {
            return Err(EvalError::missing_context(format!(
                "unsupported currency {other:?}"
            )))
        }
    };
    let token = intent
        .token()
        .ok_or_else(|| EvalError::missing_context("intent has no token to price"))?;
    let price = ctx
        .prices
        .data
        .price(token, fiat)
        .ok_or_else(|| EvalError::missing_context(format!("no {currency} price for {token}")))?;
    amount
        .convert(price)
        .map_err(|e| EvalError::missing_context(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use alloy_primitives::Address;
    use chrono::Utc;
    use warden_core::{
        Action, AssetId, ComparisonOperator, EntitySnapshot, Feed, PriceSheet, RequestPayload,
        TransactionRequest, UserId, WalletId,
    };
    use warden_decoder::{Intent, IntentType};

    fn native_intent(amount: &str) -> Intent {
        Intent::TransferNative {
            asset: AssetId::native(137, 966),
            amount: Amount::parse(amount).unwrap(),
            to: Address::repeat_byte(0x02),
        }
    }

    fn context(intent: Option<Intent>) -> EvaluationContext {
        EvaluationContext {
            action: Action::SignTransaction,
            intent,
            principal: UserId::new(),
            wallet_id: WalletId::new(),
            payload: RequestPayload::SignTransaction {
                transaction: TransactionRequest {
                    from: Address::repeat_byte(0x01),
                    to: Some(Address::repeat_byte(0x02)),
                    chain_id: 137,
                    value: Some(Amount::from_u64(1)),
                    data: None,
                    nonce: None,
                    gas: None,
                },
            },
            request_hash: String::new(),
            nonce: "n".to_string(),
            consumed_nonces: HashSet::new(),
            approvals: vec![],
            entities: EntitySnapshot::default(),
            transfers: Feed::new("history", "00", vec![]),
            prices: Feed::new("prices", "00", PriceSheet::default()),
            now: Utc::now(),
        }
    }

    #[test]
    fn action_membership() {
        let ctx = context(None);
        let satisfied = evaluate_criterion(
            &Criterion::CheckAction {
                actions: vec![Action::SignTransaction],
            },
            &ctx,
        )
        .unwrap();
        assert!(satisfied.is_satisfied());

        let unsatisfied = evaluate_criterion(
            &Criterion::CheckAction {
                actions: vec![Action::GrantPermission],
            },
            &ctx,
        )
        .unwrap();
        assert!(!unsatisfied.is_satisfied());
    }

    #[test]
    fn intent_amount_in_native_units() {
        let ctx = context(Some(native_intent("500000000000000000")));
        let criterion = Criterion::CheckIntentAmount {
            currency: "*".to_string(),
            operator: ComparisonOperator::Lte,
            value: Amount::parse("1000000000000000000").unwrap(),
        };
        assert!(evaluate_criterion(&criterion, &ctx).unwrap().is_satisfied());

        let over = context(Some(native_intent("1500000000000000000")));
        assert!(!evaluate_criterion(&criterion, &over).unwrap().is_satisfied());
    }

    #[test]
    fn intent_amount_converts_to_fiat() {
        let mut ctx = context(Some(native_intent("2000000000000000000")));
        // 2.5e-18 usd per base unit: 2 whole units are worth 5 usd.
        ctx.prices.data.set_price(
            AssetId::native(137, 966),
            FiatCurrency::Usd,
            Amount::parse("2500000000000000000").unwrap(),
        );
        let criterion = Criterion::CheckIntentAmount {
            currency: "usd".to_string(),
            operator: ComparisonOperator::Eq,
            value: Amount::parse("5000000000000000000").unwrap(),
        };
        assert!(evaluate_criterion(&criterion, &ctx).unwrap().is_satisfied());
    }

    #[test]
    fn missing_price_raises() {
        let ctx = context(Some(native_intent("1000")));
        let criterion = Criterion::CheckIntentAmount {
            currency: "usd".to_string(),
            operator: ComparisonOperator::Gt,
            value: Amount::from_u64(1),
        };
        assert!(matches!(
            evaluate_criterion(&criterion, &ctx),
            Err(EvalError::MissingContext { .. })
        ));
    }

    #[test]
    fn intent_criteria_do_not_apply_without_intent() {
        let ctx = context(None);
        let criterion = Criterion::CheckIntentType {
            intent_types: vec![IntentType::TransferNative],
        };
        assert!(!evaluate_criterion(&criterion, &ctx).unwrap().is_satisfied());
    }

    #[test]
    fn nonce_replay_fails_criterion() {
        let mut ctx = context(None);
        assert!(evaluate_criterion(&Criterion::CheckNonceExists, &ctx)
            .unwrap()
            .is_satisfied());
        ctx.consumed_nonces.insert("n".to_string());
        assert!(!evaluate_criterion(&Criterion::CheckNonceExists, &ctx)
            .unwrap()
            .is_satisfied());
    }

    #[test]
    fn resource_integrity_detects_tampering() {
        let mut ctx = context(None);
        ctx.request_hash = hash::digest_hex(&ctx.payload).unwrap();
        assert!(evaluate_criterion(&Criterion::CheckResourceIntegrity, &ctx)
            .unwrap()
            .is_satisfied());

        ctx.payload = RequestPayload::SignMessage {
            message: "tampered".to_string(),
        };
        assert!(!evaluate_criterion(&Criterion::CheckResourceIntegrity, &ctx)
            .unwrap()
            .is_satisfied());
    }
}
