//! Authorization request lifecycle engine
//!
//! Owns the request state machine: intake with idempotent creation, a
//! dedup-guarded dispatch queue, a worker pool that evaluates requests
//! against the active policy set, and multi-node consensus that only
//! advances a request when every node agrees on the decision.

pub mod collaborators;
pub mod config;
pub mod consensus;
pub mod error;
pub mod intake;
pub mod machine;
pub mod queue;
pub mod request;
pub mod store;
pub mod worker;

pub use collaborators::{
    with_timeout, Clock, EntityDirectory, PolicyProvider, PriceFeed, SystemClock, TransferFeed,
};
pub use config::EngineConfig;
pub use consensus::{reconcile, ConsensusEvaluator};
pub use error::{EngineError, EngineResult};
pub use intake::{resubmit_with_approval, submit};
pub use machine::{Collaborators, EngineNode};
pub use queue::{InMemoryQueue, JobQueue};
pub use request::{AuthorizationRequest, Evaluation, RequestStatus};
pub use store::{InMemoryStore, RequestStore};
pub use worker::WorkerPool;
