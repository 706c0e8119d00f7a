//! Event journal: per-stream append-only storage.
//!
//! This module contains:
//! - Stream positioning types (`StreamVersion`, `EventStreamHeader`)
//! - `AppendOperation`: optimistic-concurrency batch writes
//! - `EventStreamCursor`: lazy slice-by-slice reads
//! - `EventJournal`: the client facade tying both to a `StreamTable`

use crate::storage::TableError;

pub mod append;
pub mod cursor;
pub mod event;
pub mod facade;
mod schema;
pub mod slice;
pub mod version;

pub use append::AppendOperation;
pub use cursor::{EventStreamCursor, FetchEvents, FetchedSlice};
pub use event::JournaledEvent;
pub use facade::EventJournal;
pub use slice::EventStreamSlice;
pub use version::{ConcurrencyToken, EventStreamHeader, StreamVersion};

/// Result type for journal operations.
pub type Result<T> = std::result::Result<T, JournalError>;

/// Errors that can occur during journal operations.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// Another writer advanced the stream first. Re-read the header and retry.
    #[error("event stream '{stream}' was concurrently updated")]
    StreamConcurrency { stream: String },

    #[error("append operation was not prepared")]
    NotPrepared,

    #[error("stream cursor is in its initial state")]
    CursorNotInitialized,

    #[error("journal row has unexpected shape: stream={stream}, row={row}")]
    CorruptRow { stream: String, row: String },

    #[error("table error: {0}")]
    Table(#[from] TableError),
}
