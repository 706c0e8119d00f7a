//! Adaptive polling backoff.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::NotificationsConfig;

/// Wait duration that grows on empty polls and resets on a successful one.
#[derive(Debug, Clone)]
pub struct PollingTimeout {
    floor: Duration,
    cap: Duration,
    current: Duration,
}

impl PollingTimeout {
    pub fn new(floor: Duration, cap: Duration) -> Self {
        let cap = cap.max(floor);
        Self {
            floor,
            cap,
            current: floor,
        }
    }

    pub fn from_config(config: &NotificationsConfig) -> Self {
        Self::new(config.polling_floor(), config.polling_cap())
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    /// Double the wait, saturating at the cap.
    pub fn increase(&mut self) {
        self.current = (self.current * 2).min(self.cap);
    }

    /// Restore the floor value.
    pub fn reset(&mut self) {
        self.current = self.floor;
    }

    /// Sleep for the current duration, returning early when cancelled.
    pub async fn wait(&self, cancellation: &CancellationToken) {
        tokio::select! {
            _ = cancellation.cancelled() => {}
            _ = tokio::time::sleep(self.current) => {}
        }
    }
}

impl Default for PollingTimeout {
    fn default() -> Self {
        Self::from_config(&NotificationsConfig::default())
    }
}
