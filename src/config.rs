//! Client configuration.
//!
//! Plain data structs with serde support so applications can load them
//! from whatever configuration source they use. Every field has a default
//! suitable for local development.

use std::time::Duration;

use serde::Deserialize;

/// Journal read configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Maximum number of events fetched per cursor slice.
    pub slice_size: usize,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self { slice_size: 100 }
    }
}

/// Notification polling configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Floor of the adaptive polling wait, in milliseconds.
    pub polling_floor_ms: u64,
    /// Cap of the adaptive polling wait, in milliseconds.
    pub polling_cap_ms: u64,
    /// Concurrent notification processing allowed per subscription.
    pub max_processing_per_subscription: usize,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            polling_floor_ms: 100,
            polling_cap_ms: 30_000,
            max_processing_per_subscription: 32,
        }
    }
}

impl NotificationsConfig {
    /// Floor of the adaptive polling wait.
    pub fn polling_floor(&self) -> Duration {
        Duration::from_millis(self.polling_floor_ms)
    }

    /// Cap of the adaptive polling wait.
    pub fn polling_cap(&self) -> Duration {
        Duration::from_millis(self.polling_cap_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifications_config_defaults() {
        let config = NotificationsConfig::default();
        assert_eq!(config.polling_floor(), Duration::from_millis(100));
        assert_eq!(config.polling_cap(), Duration::from_secs(30));
        assert_eq!(config.max_processing_per_subscription, 32);
    }

    #[test]
    fn test_journal_config_default_slice_size() {
        assert_eq!(JournalConfig::default().slice_size, 100);
    }
}
