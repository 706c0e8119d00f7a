//! Consumer registry contract and identities.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors that can occur during consumer registration.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("consumer registration failed: {0}")]
    Registration(String),
}

/// Durable identity of a registered stream consumer.
///
/// Issued once per consumer name and stable for the subscription lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventStreamConsumerId(Uuid);

impl EventStreamConsumerId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EventStreamConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Registry issuing stable consumer identities by name.
#[async_trait]
pub trait ConsumersRegistry: Send + Sync {
    /// Register `consumer_name`, returning its stable id. Idempotent per name.
    async fn register(&self, consumer_name: &str) -> Result<EventStreamConsumerId>;
}

/// In-memory registry for tests and standalone use.
#[derive(Default)]
pub struct InMemoryConsumersRegistry {
    ids: RwLock<HashMap<String, EventStreamConsumerId>>,
}

impl InMemoryConsumersRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConsumersRegistry for InMemoryConsumersRegistry {
    async fn register(&self, consumer_name: &str) -> Result<EventStreamConsumerId> {
        let mut ids = self.ids.write().await;
        if let Some(id) = ids.get(consumer_name) {
            return Ok(*id);
        }

        let id = EventStreamConsumerId::new();
        ids.insert(consumer_name.to_string(), id);
        info!(consumer = %consumer_name, consumer_id = %id, "Consumer registered");
        Ok(id)
    }
}
