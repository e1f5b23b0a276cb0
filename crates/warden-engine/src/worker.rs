//! Evaluation worker pool
//!
//! A fixed number of tokio tasks drain the dispatch queue. Each worker owns
//! one request at a time; transient failures are retried in place with
//! linear backoff until the retry budget runs out, at which point the
//! request is failed rather than left to spin.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use warden_core::RequestId;

use crate::machine::EngineNode;
use crate::queue::JobQueue;

/// Pool of evaluation workers bound to one node
pub struct WorkerPool {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `worker_count` workers draining the queue
    pub fn start(node: Arc<EngineNode>, queue: Arc<dyn JobQueue>) -> Self {
        let (shutdown, _) = watch::channel(false);
        let handles = (0..node.config().worker_count)
            .map(|index| {
                let node = Arc::clone(&node);
                let queue = Arc::clone(&queue);
                let mut rx = shutdown.subscribe();
                tokio::spawn(async move {
                    debug!(worker = index, "worker started");
                    loop {
                        tokio::select! {
                            _ = rx.changed() => break,
                            next = queue.next() => {
                                let Some(request_id) = next else { break };
                                run_with_retries(&node, request_id).await;
                                queue.complete(request_id).await;
                            }
                        }
                    }
                    debug!(worker = index, "worker stopped");
                })
            })
            .collect();
        Self { shutdown, handles }
    }

    /// Stop all workers and wait for in-flight evaluations to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

/// Process one request, retrying transient failures with linear backoff
async fn run_with_retries(node: &EngineNode, request_id: RequestId) {
    let max_retries = node.config().max_retries;
    let backoff = node.config().retry_backoff();
    let mut attempt: u32 = 0;

    loop {
        match node.process(request_id).await {
            Ok(_) => return,
            Err(error) if error.is_transient() => {
                attempt += 1;
                if attempt > max_retries {
                    warn!(request_id = %request_id, %error, "retry budget exhausted");
                    if let Err(fail_error) = node
                        .mark_failed(request_id, format!("retries exhausted: {error}"))
                        .await
                    {
                        warn!(request_id = %request_id, %fail_error, "could not mark failed");
                    }
                    return;
                }
                tokio::time::sleep(backoff * attempt).await;
            }
            Err(error) => {
                // Terminal or operator-facing; process() already recorded
                // whatever state applies.
                warn!(request_id = %request_id, %error, "evaluation attempt failed");
                return;
            }
        }
    }
}
