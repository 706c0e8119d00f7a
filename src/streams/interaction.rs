//! Shared state for types interacting with one named stream.

use std::sync::Arc;

/// Liveness view of the owning store connection.
///
/// Handed to subscriptions when notification processing starts, and used
/// by stream entities to report their closed state.
pub trait ConnectionState: Send + Sync {
    /// False once the connection has been closed.
    fn is_active(&self) -> bool;
}

/// Base state embedded by stream readers, writers, and consumers.
///
/// Carries the stream name and the connection's liveness; embedding types
/// expose their own stream version on top.
pub struct StreamInteraction {
    stream_name: String,
    connection_state: Arc<dyn ConnectionState>,
}

impl StreamInteraction {
    pub fn new(
        stream_name: impl Into<String>,
        connection_state: Arc<dyn ConnectionState>,
    ) -> Self {
        Self {
            stream_name: stream_name.into(),
            connection_state,
        }
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    /// True once the owning connection has been closed.
    pub fn is_closed(&self) -> bool {
        !self.connection_state.is_active()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    struct FlaggedConnection(AtomicBool);

    impl ConnectionState for FlaggedConnection {
        fn is_active(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_closed_follows_connection_state() {
        let connection = Arc::new(FlaggedConnection(AtomicBool::new(true)));
        let interaction = StreamInteraction::new("orders-1", connection.clone());

        assert_eq!(interaction.stream_name(), "orders-1");
        assert!(!interaction.is_closed());

        connection.0.store(false, Ordering::SeqCst);
        assert!(interaction.is_closed());
    }
}
