//! Engine configuration

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Tunables for a single engine node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Concurrent evaluation workers
    pub worker_count: usize,
    /// Per-collaborator fetch timeout, in milliseconds
    pub collaborator_timeout_ms: u64,
    /// Base delay before redispatching a transiently failed request
    pub retry_backoff_ms: u64,
    /// Evaluation attempts before a transient failure becomes fatal
    pub max_retries: u32,
    /// Feed sources the node accepts signed data from
    pub recognized_feed_sources: HashSet<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            collaborator_timeout_ms: 5_000,
            retry_backoff_ms: 250,
            max_retries: 3,
            recognized_feed_sources: ["transfer-history", "price-oracle"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> EngineResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| EngineError::config(format!("failed to parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would stall the engine
    pub fn validate(&self) -> EngineResult<()> {
        if self.worker_count == 0 {
            return Err(EngineError::config("worker_count must be at least 1"));
        }
        if self.collaborator_timeout_ms == 0 {
            return Err(EngineError::config(
                "collaborator_timeout_ms must be positive",
            ));
        }
        Ok(())
    }

    /// Collaborator timeout as a duration
    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }

    /// Retry backoff as a duration
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}
