//! Binding between one registered consumer and its listener.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::registry::EventStreamConsumerId;
use crate::streams::ConnectionState;

use super::channel::NotificationsChannel;
use super::listener::NotificationListener;
use super::types::StreamUpdated;
use super::Result;

/// One consumer's binding of identity, channel, and listener.
///
/// Owned by a single hub from subscribe until unsubscribe. Holds the
/// connection only while running; after `stop` returns, incoming
/// notifications are dropped.
pub struct NotificationListenerSubscription {
    consumer_id: EventStreamConsumerId,
    channel: Arc<dyn NotificationsChannel>,
    listener: Arc<dyn NotificationListener>,
    connection: RwLock<Option<Arc<dyn ConnectionState>>>,
    delivered: AtomicU64,
}

impl NotificationListenerSubscription {
    pub fn new(
        consumer_id: EventStreamConsumerId,
        channel: Arc<dyn NotificationsChannel>,
        listener: Arc<dyn NotificationListener>,
    ) -> Self {
        Self {
            consumer_id,
            channel,
            listener,
            connection: RwLock::new(None),
            delivered: AtomicU64::new(0),
        }
    }

    pub fn consumer_id(&self) -> EventStreamConsumerId {
        self.consumer_id
    }

    /// Number of notifications delivered to the listener.
    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::SeqCst)
    }

    /// Begin accepting notifications against `connection`.
    pub async fn start(&self, connection: Arc<dyn ConnectionState>) {
        *self.connection.write().await = Some(connection);
        info!(consumer_id = %self.consumer_id, "Subscription started");
    }

    /// Stop accepting notifications.
    pub async fn stop(&self) {
        *self.connection.write().await = None;
        info!(consumer_id = %self.consumer_id, "Subscription stopped");
    }

    async fn is_running(&self) -> bool {
        self.connection.read().await.is_some()
    }

    /// Handle one notification dispatched by the hub.
    ///
    /// The hub fans out without filtering; addressing is decided here. An
    /// unaddressed notification is addressed to this consumer first, then
    /// the recipient check gates delivery. A failing listener gets the
    /// notification back on the channel for redelivery (at-least-once).
    pub async fn handle_notification(&self, notification: StreamUpdated) -> Result<()> {
        if !self.is_running().await {
            debug!(
                consumer_id = %self.consumer_id,
                notification_id = %notification.notification_id(),
                "Dropped notification received after stop"
            );
            return Ok(());
        }

        let notification = if notification.is_addressed() {
            notification
        } else {
            notification.send_to(self.consumer_id)
        };

        if !notification.is_addressed_to(&self.consumer_id)? {
            return Ok(());
        }

        match self.listener.on_stream_updated(notification.clone()).await {
            Ok(()) => {
                self.delivered.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            Err(err) => {
                warn!(
                    consumer_id = %self.consumer_id,
                    notification_id = %notification.notification_id(),
                    error = %err,
                    "Listener failed; redelivering notification"
                );
                self.channel.send(notification).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use async_trait::async_trait;

    use super::*;
    use crate::journal::StreamVersion;
    use crate::notifications::channel::InMemoryChannel;
    use crate::notifications::NotificationError;

    struct ActiveConnection;

    impl ConnectionState for ActiveConnection {
        fn is_active(&self) -> bool {
            true
        }
    }

    struct CountingListener {
        calls: AtomicU64,
        fail: AtomicBool,
    }

    impl CountingListener {
        fn new() -> Self {
            Self {
                calls: AtomicU64::new(0),
                fail: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl NotificationListener for CountingListener {
        fn name(&self) -> &str {
            "counting-listener"
        }

        async fn on_stream_updated(&self, _notification: StreamUpdated) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(NotificationError::Listener("boom".to_string()));
            }
            Ok(())
        }
    }

    fn notification() -> StreamUpdated {
        StreamUpdated::new("orders-1", StreamVersion::new(1), StreamVersion::new(2))
    }

    fn subscription(
        listener: Arc<CountingListener>,
        channel: Arc<InMemoryChannel>,
    ) -> NotificationListenerSubscription {
        NotificationListenerSubscription::new(EventStreamConsumerId::new(), channel, listener)
    }

    #[tokio::test]
    async fn test_not_running_drops_notifications() {
        let listener = Arc::new(CountingListener::new());
        let subscription = subscription(listener.clone(), Arc::new(InMemoryChannel::new()));

        subscription.handle_notification(notification()).await.unwrap();
        assert_eq!(listener.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unaddressed_notification_is_delivered_once_addressed() {
        let listener = Arc::new(CountingListener::new());
        let subscription = subscription(listener.clone(), Arc::new(InMemoryChannel::new()));
        subscription.start(Arc::new(ActiveConnection)).await;

        subscription.handle_notification(notification()).await.unwrap();
        assert_eq!(listener.calls.load(Ordering::SeqCst), 1);
        assert_eq!(subscription.delivered_count(), 1);
    }

    #[tokio::test]
    async fn test_notification_addressed_elsewhere_is_ignored() {
        let listener = Arc::new(CountingListener::new());
        let subscription = subscription(listener.clone(), Arc::new(InMemoryChannel::new()));
        subscription.start(Arc::new(ActiveConnection)).await;

        let foreign = notification().send_to(EventStreamConsumerId::new());
        subscription.handle_notification(foreign).await.unwrap();
        assert_eq!(listener.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_listener_failure_requeues_the_notification() {
        let listener = Arc::new(CountingListener::new());
        listener.fail.store(true, Ordering::SeqCst);
        let channel = Arc::new(InMemoryChannel::new());
        let subscription = subscription(listener.clone(), channel.clone());
        subscription.start(Arc::new(ActiveConnection)).await;

        subscription.handle_notification(notification()).await.unwrap();
        assert_eq!(subscription.delivered_count(), 0);
        assert_eq!(channel.pending_count().await, 1);

        // The requeued copy stays addressed to this consumer.
        let requeued = channel.receive_notifications().await.unwrap();
        assert!(requeued[0]
            .is_addressed_to(&subscription.consumer_id())
            .unwrap());
    }
}
