//! Fluent consumer configuration.

use crate::registry::EventStreamConsumerId;

/// Consumer name used when the application does not pick one.
pub const DEFAULT_CONSUMER_NAME: &str = "default-consumer";

/// Errors reported when a configuration is incomplete.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConsumerConfigError {
    #[error("stream name was not specified")]
    MissingStreamName,

    #[error("consumer identity was not specified")]
    MissingIdentity,
}

/// Builder collecting everything needed to open a stream consumer.
///
/// Identity is either a consumer name (registered on first use) or an
/// already-issued consumer id; setting one clears the other.
#[derive(Debug, Clone)]
pub struct EventStreamConsumerConfig {
    stream_name: Option<String>,
    consumer_name: Option<String>,
    consumer_id: Option<EventStreamConsumerId>,
    auto_commit: bool,
    start_from_end: bool,
}

impl Default for EventStreamConsumerConfig {
    fn default() -> Self {
        Self {
            stream_name: None,
            consumer_name: Some(DEFAULT_CONSUMER_NAME.to_string()),
            consumer_id: None,
            auto_commit: true,
            start_from_end: false,
        }
    }
}

impl EventStreamConsumerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `stream_name`, optionally starting from the stream's end.
    pub fn read_stream(mut self, stream_name: impl Into<String>, start_from_end: bool) -> Self {
        self.stream_name = Some(stream_name.into());
        self.start_from_end = start_from_end;
        self
    }

    pub fn use_consumer_name(mut self, consumer_name: impl Into<String>) -> Self {
        self.consumer_id = None;
        self.consumer_name = Some(consumer_name.into());
        self
    }

    pub fn use_consumer_id(mut self, consumer_id: EventStreamConsumerId) -> Self {
        self.consumer_name = None;
        self.consumer_id = Some(consumer_id);
        self
    }

    /// Commit processed stream positions automatically. On by default.
    pub fn auto_commit(mut self, enabled: bool) -> Self {
        self.auto_commit = enabled;
        self
    }

    /// Ensure the configuration is complete enough to open a consumer.
    pub fn validate(&self) -> Result<(), ConsumerConfigError> {
        if self.stream_name.as_deref().map_or(true, str::is_empty) {
            return Err(ConsumerConfigError::MissingStreamName);
        }
        if self.consumer_name.is_none() && self.consumer_id.is_none() {
            return Err(ConsumerConfigError::MissingIdentity);
        }
        Ok(())
    }

    /// True when the consumer still needs a registry-issued id.
    pub fn registration_required(&self) -> bool {
        self.consumer_id.is_none()
    }

    pub fn stream_name(&self) -> Option<&str> {
        self.stream_name.as_deref()
    }

    pub fn consumer_name(&self) -> Option<&str> {
        self.consumer_name.as_deref()
    }

    pub fn consumer_id(&self) -> Option<EventStreamConsumerId> {
        self.consumer_id
    }

    pub fn auto_commit_enabled(&self) -> bool {
        self.auto_commit
    }

    pub fn start_from_end(&self) -> bool {
        self.start_from_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uses_named_identity_with_auto_commit() {
        let config = EventStreamConsumerConfig::new();
        assert_eq!(config.consumer_name(), Some(DEFAULT_CONSUMER_NAME));
        assert!(config.auto_commit_enabled());
        assert!(config.registration_required());
    }

    #[test]
    fn test_validate_requires_stream_name() {
        let config = EventStreamConsumerConfig::new();
        assert_eq!(
            config.validate(),
            Err(ConsumerConfigError::MissingStreamName)
        );

        let config = config.read_stream("orders-1", false);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_identity_setters_are_mutually_exclusive() {
        let id = EventStreamConsumerId::new();
        let config = EventStreamConsumerConfig::new()
            .read_stream("orders-1", false)
            .use_consumer_id(id);
        assert_eq!(config.consumer_id(), Some(id));
        assert_eq!(config.consumer_name(), None);
        assert!(!config.registration_required());

        let config = config.use_consumer_name("projections");
        assert_eq!(config.consumer_id(), None);
        assert_eq!(config.consumer_name(), Some("projections"));
        assert!(config.registration_required());
    }

    #[test]
    fn test_clearing_both_identities_fails_validation() {
        let mut config = EventStreamConsumerConfig::new().read_stream("orders-1", true);
        config.consumer_name = None;
        assert_eq!(config.validate(), Err(ConsumerConfigError::MissingIdentity));
        assert!(config.start_from_end());
    }
}
