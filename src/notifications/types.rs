//! Notification values exchanged through the hub.

use std::fmt;

use uuid::Uuid;

use crate::journal::StreamVersion;
use crate::registry::EventStreamConsumerId;

use super::{NotificationError, Result};

/// Unique identity of one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationId(Uuid);

impl NotificationId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Announces that a stream advanced from one version to another.
///
/// Notifications are immutable values. They are created unaddressed;
/// `send_to` returns a new value carrying the recipient, leaving every
/// other field untouched. Addressing happens exactly once, before any
/// recipient check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamUpdated {
    notification_id: NotificationId,
    stream_name: String,
    from_version: StreamVersion,
    to_version: StreamVersion,
    recipient: Option<EventStreamConsumerId>,
}

impl StreamUpdated {
    pub fn new(
        stream_name: impl Into<String>,
        from_version: StreamVersion,
        to_version: StreamVersion,
    ) -> Self {
        Self {
            notification_id: NotificationId::new(),
            stream_name: stream_name.into(),
            from_version,
            to_version,
            recipient: None,
        }
    }

    pub fn notification_id(&self) -> NotificationId {
        self.notification_id
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    pub fn from_version(&self) -> StreamVersion {
        self.from_version
    }

    pub fn to_version(&self) -> StreamVersion {
        self.to_version
    }

    pub fn notification_type(&self) -> &'static str {
        "StreamUpdated"
    }

    pub fn is_addressed(&self) -> bool {
        self.recipient.is_some()
    }

    /// Returns a copy of this notification addressed to `consumer_id`.
    pub fn send_to(&self, consumer_id: EventStreamConsumerId) -> Self {
        Self {
            recipient: Some(consumer_id),
            ..self.clone()
        }
    }

    /// Whether this notification is addressed to `consumer_id`.
    ///
    /// Calling this on an unaddressed notification is a misuse of the
    /// addressing protocol and fails.
    pub fn is_addressed_to(&self, consumer_id: &EventStreamConsumerId) -> Result<bool> {
        match &self.recipient {
            None => Err(NotificationError::Unaddressed {
                id: self.notification_id,
            }),
            Some(recipient) => Ok(recipient == consumer_id),
        }
    }
}
