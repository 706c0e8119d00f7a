//! Notification transport contract and the in-memory channel.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::types::StreamUpdated;
use super::Result;

/// Transport carrying notifications between writers and the hub.
///
/// Delivery is at-least-once; batches are unordered across distinct
/// consumers.
#[async_trait]
pub trait NotificationsChannel: Send + Sync {
    /// Queue a notification for eventual delivery.
    async fn send(&self, notification: StreamUpdated) -> Result<()>;

    /// Drain the next batch, empty when nothing is pending.
    async fn receive_notifications(&self) -> Result<Vec<StreamUpdated>>;
}

/// Default batch size of the in-memory channel.
const DEFAULT_BATCH_SIZE: usize = 32;

/// In-process channel backed by a shared queue, for tests and
/// single-process deployments.
pub struct InMemoryChannel {
    queue: Mutex<VecDeque<StreamUpdated>>,
    batch_size: usize,
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self::with_batch_size(DEFAULT_BATCH_SIZE)
    }

    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            batch_size: batch_size.max(1),
        }
    }

    /// Number of notifications waiting to be received.
    pub async fn pending_count(&self) -> usize {
        self.queue.lock().await.len()
    }
}

impl Default for InMemoryChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationsChannel for InMemoryChannel {
    async fn send(&self, notification: StreamUpdated) -> Result<()> {
        let mut queue = self.queue.lock().await;
        queue.push_back(notification);
        Ok(())
    }

    async fn receive_notifications(&self) -> Result<Vec<StreamUpdated>> {
        let mut queue = self.queue.lock().await;
        let count = queue.len().min(self.batch_size);
        let batch: Vec<_> = queue.drain(..count).collect();
        if !batch.is_empty() {
            debug!(count = batch.len(), "Drained notification batch");
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::StreamVersion;

    fn notification(n: u64) -> StreamUpdated {
        StreamUpdated::new("orders-1", StreamVersion::new(n), StreamVersion::new(n + 1))
    }

    #[tokio::test]
    async fn test_receive_respects_batch_size() {
        let channel = InMemoryChannel::with_batch_size(2);
        for n in 0..3 {
            channel.send(notification(n)).await.unwrap();
        }

        let batch = channel.receive_notifications().await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(channel.pending_count().await, 1);

        let batch = channel.receive_notifications().await.unwrap();
        assert_eq!(batch.len(), 1);

        let batch = channel.receive_notifications().await.unwrap();
        assert!(batch.is_empty());
    }
}
