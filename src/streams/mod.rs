//! Stream-facing surfaces shared by readers, writers, and consumers.

pub mod consumer_config;
pub mod interaction;

pub use consumer_config::{ConsumerConfigError, EventStreamConsumerConfig};
pub use interaction::{ConnectionState, StreamInteraction};
