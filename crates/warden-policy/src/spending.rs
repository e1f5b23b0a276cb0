//! Rolling-window spending aggregation
//!
//! Sums historical transfers matching the criterion's filters inside a
//! rolling window ending at the evaluation instant, plus the current intent's
//! amount when it matches the same filters, and compares the sum to the
//! limit. The window boundary is recomputed on every call; it is not a fixed
//! calendar bucket.

use chrono::Duration;

use warden_core::{Amount, ComparisonOperator};

use crate::context::EvaluationContext;
use crate::criterion::{SpendingFilters, TimeWindow};
use crate::error::{EvalError, EvalResult};

/// Evaluate a spending limit against the context
pub fn check_spending_limit(
    limit: Amount,
    operator: ComparisonOperator,
    time_window: TimeWindow,
    filters: &SpendingFilters,
    ctx: &EvaluationContext,
) -> EvalResult<bool> {
    let window_start = ctx.now - Duration::seconds(time_window.value.min(i64::MAX as u64) as i64);

    let mut sum = Amount::ZERO;
    for transfer in &ctx.transfers.data {
        if transfer.created_at <= window_start || transfer.created_at > ctx.now {
            continue;
        }
        if !filters.tokens.is_empty() && !filters.tokens.contains(&transfer.token) {
            continue;
        }
        if !filters.users.is_empty() && !filters.users.contains(&transfer.initiated_by) {
            continue;
        }
        if !filters.wallets.is_empty() && !filters.wallets.contains(&transfer.wallet_id) {
            continue;
        }
        sum = sum
            .checked_add(transfer.amount)
            .ok_or_else(|| EvalError::missing_context("transfer sum overflowed 256 bits"))?;
    }

    if let Some(current) = current_intent_amount(filters, ctx) {
        sum = sum
            .checked_add(current)
            .ok_or_else(|| EvalError::missing_context("transfer sum overflowed 256 bits"))?;
    }

    Ok(sum.compare(operator, limit))
}

/// The current intent's contribution, when it matches the filters
fn current_intent_amount(filters: &SpendingFilters, ctx: &EvaluationContext) -> Option<Amount> {
    let intent = ctx.intent.as_ref()?;
    let amount = intent.amount()?;
    if !filters.tokens.is_empty() {
        let token = intent.token()?;
        if !filters.tokens.contains(token) {
            return None;
        }
    }
    if !filters.users.is_empty() && !filters.users.contains(&ctx.principal) {
        return None;
    }
    if !filters.wallets.is_empty() && !filters.wallets.contains(&ctx.wallet_id) {
        return None;
    }
    Some(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use alloy_primitives::Address;
    use chrono::Utc;
    use warden_core::{
        Action, AssetId, EntitySnapshot, Feed, OrgId, PriceSheet, RequestPayload, Transfer, UserId,
        WalletId,
    };
    use warden_decoder::Intent;

    use crate::criterion::WindowType;

    fn rolling(seconds: u64) -> TimeWindow {
        TimeWindow {
            window_type: WindowType::Rolling,
            value: seconds,
        }
    }

    fn transfer(amount: &str, seconds_ago: i64, ctx: &EvaluationContext) -> Transfer {
        Transfer {
            org_id: OrgId::new(),
            wallet_id: ctx.wallet_id,
            from: Address::repeat_byte(0x01),
            to: Address::repeat_byte(0x02),
            token: AssetId::native(137, 966),
            amount: Amount::parse(amount).unwrap(),
            initiated_by: ctx.principal,
            created_at: ctx.now - Duration::seconds(seconds_ago),
        }
    }

    fn context_with_intent(amount: &str) -> EvaluationContext {
        EvaluationContext {
            action: Action::SignTransaction,
            intent: Some(Intent::TransferNative {
                asset: AssetId::native(137, 966),
                amount: Amount::parse(amount).unwrap(),
                to: Address::repeat_byte(0x02),
            }),
            principal: UserId::new(),
            wallet_id: WalletId::new(),
            payload: RequestPayload::SignMessage {
                message: String::new(),
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
    fn sums_window_plus_current_intent() {
        // Three prior transfers summing 0.9 native units inside a 12h window
        // plus a new 0.2 transfer exceed a 1.0 limit.
        let mut ctx = context_with_intent("200000000000000000");
        ctx.transfers.data = vec![
            transfer("300000000000000000", 600, &ctx),
            transfer("300000000000000000", 3_600, &ctx),
            transfer("300000000000000000", 40_000, &ctx),
        ];
        let exceeded = check_spending_limit(
            Amount::parse("1000000000000000000").unwrap(),
            ComparisonOperator::Gt,
            rolling(43_200),
            &SpendingFilters::default(),
            &ctx,
        )
        .unwrap();
        assert!(exceeded);
    }

    #[test]
    fn transfers_outside_window_do_not_count() {
        let mut ctx = context_with_intent("200000000000000000");
        ctx.transfers.data = vec![
            transfer("900000000000000000", 50_000, &ctx), // outside 12h
        ];
        let exceeded = check_spending_limit(
            Amount::parse("1000000000000000000").unwrap(),
            ComparisonOperator::Gt,
            rolling(43_200),
            &SpendingFilters::default(),
            &ctx,
        )
        .unwrap();
        assert!(!exceeded);
    }

    #[test]
    fn token_filter_excludes_other_assets() {
        let mut ctx = context_with_intent("100");
        let mut other = transfer("1000000", 60, &ctx);
        other.token = AssetId::native(1, 60);
        ctx.transfers.data = vec![other];

        let filters = SpendingFilters {
            tokens: vec![AssetId::native(137, 966)],
            ..Default::default()
        };
        let exceeded = check_spending_limit(
            Amount::parse("200").unwrap(),
            ComparisonOperator::Gt,
            rolling(3_600),
            &filters,
            &ctx,
        )
        .unwrap();
        // Only the current 100-unit intent matches the filter.
        assert!(!exceeded);
    }

    #[test]
    fn user_filter_excludes_other_initiators() {
        let mut ctx = context_with_intent("100");
        let mut foreign = transfer("1000", 60, &ctx);
        foreign.initiated_by = UserId::new();
        ctx.transfers.data = vec![foreign];

        let filters = SpendingFilters {
            users: vec![ctx.principal],
            ..Default::default()
        };
        let exceeded = check_spending_limit(
            Amount::parse("500").unwrap(),
            ComparisonOperator::Gt,
            rolling(3_600),
            &filters,
            &ctx,
        )
        .unwrap();
        assert!(!exceeded);
    }
}
