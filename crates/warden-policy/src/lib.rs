//! Policy evaluation engine
//!
//! Evaluates an ordered set of declarative policies against a decoded intent
//! and organizational context to reach a Permit/Forbid/Confirm decision,
//! including approval-quorum accounting and rolling-window spending limits.
//! The resolver is pure given its inputs; the only collaborator it touches is
//! the response signer.

pub mod approvals;
pub mod context;
pub mod criterion;
pub mod error;
pub mod evaluate;
pub mod resolver;
pub mod signer;
pub mod spending;

pub use approvals::{check_approvals, ApprovalOutcome};
pub use context::EvaluationContext;
pub use criterion::{
    ApprovalEntities, ApprovalRequirement, Criterion, Policy, PolicyEffect, SpendingFilters,
    TimeWindow, WindowType,
};
pub use error::{EvalError, EvalResult};
pub use evaluate::{evaluate_criterion, Verdict};
pub use resolver::{
    resolve, resolve_and_sign, sign_decision, Decision, EvaluationResponse, MatchedRule,
    ResolvedDecision,
};
pub use signer::{Ed25519ResponseSigner, ResponseSigner};
