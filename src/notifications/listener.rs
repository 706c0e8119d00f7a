//! Listener contract for notification consumers.

use async_trait::async_trait;

use super::types::StreamUpdated;
use super::Result;

/// Consumer-supplied handler invoked with one notification at a time.
///
/// A listener's name identifies its consumer in the registry; subscribing
/// the same name twice is a caller error.
#[async_trait]
pub trait NotificationListener: Send + Sync {
    /// Stable name registered with the consumer registry.
    fn name(&self) -> &str;

    /// Handle one stream-update notification.
    async fn on_stream_updated(&self, notification: StreamUpdated) -> Result<()>;
}
