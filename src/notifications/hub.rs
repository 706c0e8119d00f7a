//! Notification hub: subscription lifecycle, adaptive polling, fan-out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use crate::config::NotificationsConfig;
use crate::registry::{ConsumersRegistry, EventStreamConsumerId};
use crate::streams::ConnectionState;

use super::channel::NotificationsChannel;
use super::listener::NotificationListener;
use super::subscription::NotificationListenerSubscription;
use super::timeout::PollingTimeout;
use super::types::StreamUpdated;
use super::{NotificationError, Result};

/// Delivers stream-update notifications to subscribed consumers.
///
/// The hub owns its subscription maps exclusively; `subscribe` and
/// `unsubscribe` take `&mut self` and must not race the polling loop.
/// While processing runs, the only concurrently mutated state is the
/// processing gauge and the loop's own timeout.
///
/// Shutdown ordering is load-bearing: the polling loop is cancelled and
/// awaited, outstanding dispatches are drained, and only then are
/// subscriptions stopped, so no subscription sees a notification after
/// its stop.
pub struct NotificationHub {
    channel: Arc<dyn NotificationsChannel>,
    registry: Arc<dyn ConsumersRegistry>,
    timeout: PollingTimeout,
    max_per_subscription: usize,
    subscriptions: HashMap<EventStreamConsumerId, Arc<NotificationListenerSubscription>>,
    listener_ids: HashMap<String, EventStreamConsumerId>,
    processing_count: Arc<AtomicUsize>,
    poller: Option<Poller>,
}

struct Poller {
    cancellation: CancellationToken,
    task: JoinHandle<()>,
    dispatches: TaskTracker,
}

impl NotificationHub {
    pub fn new(
        channel: Arc<dyn NotificationsChannel>,
        registry: Arc<dyn ConsumersRegistry>,
        timeout: PollingTimeout,
    ) -> Self {
        Self {
            channel,
            registry,
            timeout,
            max_per_subscription: NotificationsConfig::default().max_processing_per_subscription,
            subscriptions: HashMap::new(),
            listener_ids: HashMap::new(),
            processing_count: Arc::new(AtomicUsize::new(0)),
            poller: None,
        }
    }

    pub fn with_config(
        channel: Arc<dyn NotificationsChannel>,
        registry: Arc<dyn ConsumersRegistry>,
        config: &NotificationsConfig,
    ) -> Self {
        let mut hub = Self::new(channel, registry, PollingTimeout::from_config(config));
        hub.max_per_subscription = config.max_processing_per_subscription.max(1);
        hub
    }

    /// Forward a notification to the channel for eventual delivery.
    pub async fn notify(&self, notification: StreamUpdated) -> Result<()> {
        self.channel.send(notification).await
    }

    /// Register `listener` with the consumer registry and store its
    /// subscription. Subscribing the same listener name twice fails.
    pub async fn subscribe(
        &mut self,
        listener: Arc<dyn NotificationListener>,
    ) -> Result<EventStreamConsumerId> {
        let name = listener.name().to_string();
        if self.listener_ids.contains_key(&name) {
            return Err(NotificationError::AlreadySubscribed { name });
        }

        let consumer_id = self.registry.register(&name).await?;
        let subscription = Arc::new(NotificationListenerSubscription::new(
            consumer_id,
            self.channel.clone(),
            listener,
        ));
        self.subscriptions.insert(consumer_id, subscription);
        self.listener_ids.insert(name.clone(), consumer_id);

        info!(listener = %name, consumer_id = %consumer_id, "Listener subscribed");

        Ok(consumer_id)
    }

    /// Remove `listener`'s subscription. Unknown listeners are a caller error.
    pub fn unsubscribe(&mut self, listener: &dyn NotificationListener) -> Result<()> {
        let name = listener.name();
        let Some(consumer_id) = self.listener_ids.remove(name) else {
            return Err(NotificationError::NotSubscribed {
                name: name.to_string(),
            });
        };
        self.subscriptions.remove(&consumer_id);

        info!(listener = %name, consumer_id = %consumer_id, "Listener unsubscribed");

        Ok(())
    }

    /// Current number of in-flight notification dispatches.
    pub fn processing_count(&self) -> usize {
        self.processing_count.load(Ordering::SeqCst)
    }

    /// Start every subscription and launch the polling loop.
    ///
    /// A hub with no subscriptions is fully inert: no registry calls, no
    /// background task.
    pub async fn start_processing(&mut self, connection: Arc<dyn ConnectionState>) {
        if self.subscriptions.is_empty() || self.poller.is_some() {
            return;
        }

        let max_processing = self.max_per_subscription * self.subscriptions.len();

        for subscription in self.subscriptions.values() {
            subscription.start(connection.clone()).await;
        }

        let cancellation = CancellationToken::new();
        let dispatches = TaskTracker::new();
        let polling = PollingLoop {
            channel: self.channel.clone(),
            subscriptions: self.subscriptions.values().cloned().collect(),
            timeout: self.timeout.clone(),
            processing_count: self.processing_count.clone(),
            max_processing,
            cancellation: cancellation.clone(),
            dispatches: dispatches.clone(),
        };
        let task = tokio::spawn(polling.run());
        self.poller = Some(Poller {
            cancellation,
            task,
            dispatches,
        });

        info!(
            subscriptions = self.subscriptions.len(),
            max_processing, "Notification processing started"
        );
    }

    /// Stop the polling loop, drain in-flight dispatches, stop subscriptions.
    pub async fn stop_processing(&mut self) {
        if self.subscriptions.is_empty() {
            return;
        }

        // Call sequence is important: first stop receiving new
        // notifications, then wait for the received ones to finish
        // processing. Only then is stopping subscriptions safe.
        if let Some(poller) = self.poller.take() {
            poller.cancellation.cancel();
            if let Err(err) = poller.task.await {
                error!(error = %err, "Polling task terminated abnormally");
            }
            poller.dispatches.close();
            poller.dispatches.wait().await;
        }

        for subscription in self.subscriptions.values() {
            subscription.stop().await;
        }

        info!("Notification processing stopped");
    }
}

struct PollingLoop {
    channel: Arc<dyn NotificationsChannel>,
    subscriptions: Vec<Arc<NotificationListenerSubscription>>,
    timeout: PollingTimeout,
    processing_count: Arc<AtomicUsize>,
    max_processing: usize,
    cancellation: CancellationToken,
    dispatches: TaskTracker,
}

impl PollingLoop {
    async fn run(mut self) {
        info!("Starting notification processing cycle");

        while !self.cancellation.is_cancelled() {
            let notifications = self.receive().await;

            if notifications.is_empty() {
                debug!(
                    timeout = ?self.timeout.current(),
                    "No notifications for processing; backing off"
                );
                self.timeout.wait(&self.cancellation).await;
                self.timeout.increase();
            } else {
                self.timeout.reset();
                for notification in notifications {
                    self.dispatch(notification);
                }
            }
        }

        info!("Notification processing cycle stopped");
    }

    /// Pull the next batch, or an empty one while the processing gauge
    /// sits at its maximum. Intake is throttled, never delivery.
    async fn receive(&self) -> Vec<StreamUpdated> {
        let in_flight = self.processing_count.load(Ordering::SeqCst);
        if in_flight >= self.max_processing {
            debug!(
                in_flight,
                max_processing = self.max_processing,
                "Processing limit reached; skipping channel poll"
            );
            return Vec::new();
        }

        match self.channel.receive_notifications().await {
            Ok(batch) => batch,
            Err(err) => {
                error!(error = %err, "Failed to receive notifications");
                Vec::new()
            }
        }
    }

    /// Fan one notification out to every subscription.
    ///
    /// Each (notification, subscription) pair runs as its own tracked
    /// task; the subscription decides whether the notification concerns
    /// it. A failing dispatch is logged and never aborts the loop.
    fn dispatch(&self, notification: StreamUpdated) {
        for subscription in &self.subscriptions {
            let subscription = subscription.clone();
            let notification = notification.clone();
            let gauge = self.processing_count.clone();

            gauge.fetch_add(1, Ordering::SeqCst);
            self.dispatches.spawn(async move {
                if let Err(err) = subscription.handle_notification(notification).await {
                    error!(
                        consumer_id = %subscription.consumer_id(),
                        error = %err,
                        "Unhandled failure in notification listener subscription"
                    );
                }
                gauge.fetch_sub(1, Ordering::SeqCst);
            });
        }
    }
}
