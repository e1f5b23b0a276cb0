//! Dispatch queue with in-flight deduplication
//!
//! The queue tracks which request ids are currently held by a worker and
//! rejects a second dispatch of the same id until the first completes. Dedup
//! happens at enqueue time, so a duplicate never consumes a worker slot.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use warden_core::RequestId;

use crate::error::{EngineError, EngineResult};

/// Dispatch interface between request intake and the worker pool
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a request id for evaluation
    ///
    /// Fails with `AlreadyProcessing` when the id is already queued or held
    /// by a worker.
    async fn enqueue(&self, request_id: RequestId) -> EngineResult<()>;

    /// Receive the next request id, or `None` once the queue is closed
    async fn next(&self) -> Option<RequestId>;

    /// Release an id after its evaluation attempt finishes
    ///
    /// Must be called for every id returned by `next`, on success and
    /// failure alike, or the id stays blocked forever.
    async fn complete(&self, request_id: RequestId);
}

/// Channel-backed queue for a single process
pub struct InMemoryQueue {
    sender: mpsc::UnboundedSender<RequestId>,
    receiver: tokio::sync::Mutex<mpsc::UnboundedReceiver<RequestId>>,
    in_flight: Mutex<HashSet<RequestId>>,
}

impl InMemoryQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: tokio::sync::Mutex::new(receiver),
            in_flight: Mutex::new(HashSet::new()),
        }
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobQueue for InMemoryQueue {
    async fn enqueue(&self, request_id: RequestId) -> EngineResult<()> {
        {
            let mut in_flight = self.in_flight.lock();
            if !in_flight.insert(request_id) {
                return Err(EngineError::AlreadyProcessing { request_id });
            }
        }
        if self.sender.send(request_id).is_err() {
            self.in_flight.lock().remove(&request_id);
            return Err(EngineError::store("queue closed"));
        }
        Ok(())
    }

    async fn next(&self) -> Option<RequestId> {
        self.receiver.lock().await.recv().await
    }

    async fn complete(&self, request_id: RequestId) {
        self.in_flight.lock().remove(&request_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn duplicate_enqueue_is_rejected() {
        let queue = InMemoryQueue::new();
        let id = RequestId::new();
        queue.enqueue(id).await.unwrap();
        assert_matches!(
            queue.enqueue(id).await,
            Err(EngineError::AlreadyProcessing { request_id }) if request_id == id
        );
    }

    #[tokio::test]
    async fn completion_allows_requeue() {
        let queue = InMemoryQueue::new();
        let id = RequestId::new();
        queue.enqueue(id).await.unwrap();
        assert_eq!(queue.next().await, Some(id));
        queue.complete(id).await;
        queue.enqueue(id).await.unwrap();
        assert_eq!(queue.next().await, Some(id));
    }

    #[tokio::test]
    async fn delivery_preserves_enqueue_order() {
        let queue = InMemoryQueue::new();
        let first = RequestId::new();
        let second = RequestId::new();
        queue.enqueue(first).await.unwrap();
        queue.enqueue(second).await.unwrap();
        assert_eq!(queue.next().await, Some(first));
        assert_eq!(queue.next().await, Some(second));
    }
}
