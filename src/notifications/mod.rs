//! Stream-update notifications.
//!
//! This module contains:
//! - `StreamUpdated`: the addressable notification value
//! - `NotificationsChannel` trait and the in-memory channel
//! - `NotificationListener` trait for consumer-supplied handlers
//! - `NotificationListenerSubscription`: one consumer's binding
//! - `PollingTimeout`: adaptive backoff between empty polls
//! - `NotificationHub`: subscription lifecycle, polling, fan-out dispatch

use crate::registry::RegistryError;

pub mod channel;
pub mod hub;
pub mod listener;
pub mod subscription;
pub mod timeout;
pub mod types;

pub use channel::{InMemoryChannel, NotificationsChannel};
pub use hub::NotificationHub;
pub use listener::NotificationListener;
pub use subscription::NotificationListenerSubscription;
pub use timeout::PollingTimeout;
pub use types::{NotificationId, StreamUpdated};

/// Result type for notification operations.
pub type Result<T> = std::result::Result<T, NotificationError>;

/// Errors that can occur during notification handling.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// `is_addressed_to` was called before `send_to`.
    #[error("notification {id} has no recipient; address it with send_to first")]
    Unaddressed { id: NotificationId },

    #[error("listener '{name}' is already subscribed")]
    AlreadySubscribed { name: String },

    #[error("listener '{name}' is not subscribed")]
    NotSubscribed { name: String },

    #[error("channel error: {0}")]
    Channel(String),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("listener failed: {0}")]
    Listener(String),
}
