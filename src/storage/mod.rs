//! Table storage backend contract.
//!
//! The journal persists through a minimal table abstraction: per-partition
//! atomic batches of insert / conditional-merge / upsert writes, plus the
//! row reads a stream reader needs. A failed batch reports which entry
//! failed and with which status code so callers can classify conflicts.
//!
//! Implementations:
//! - `MemoryTable`: in-memory storage for tests and standalone use

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;

use crate::journal::ConcurrencyToken;

pub mod memory;

pub use memory::MemoryTable;

/// Result type for table operations.
pub type Result<T> = std::result::Result<T, TableError>;

/// Errors that can occur during table operations.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("batch entry {index} failed with {code:?}: {message}")]
    Batch {
        index: usize,
        code: BatchStatusCode,
        message: String,
    },

    #[error("table unavailable: {0}")]
    Unavailable(String),
}

/// Status code reported for a failed batch entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatusCode {
    /// Insert collided with an existing row.
    Conflict,
    /// Conditional merge token did not match the stored one.
    PreconditionFailed,
    /// Any other backend status.
    Other,
}

/// Column value stored in a table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnValue {
    Text(String),
    Integer(i64),
    Binary(Bytes),
}

/// Row contents keyed by column name.
pub type Columns = HashMap<String, ColumnValue>;

/// One write in an atomic batch.
#[derive(Debug, Clone)]
pub enum BatchWrite {
    /// Insert a new row. Fails with `Conflict` if the row already exists.
    Insert { row: String, columns: Columns },
    /// Merge columns into an existing row iff `token` matches the stored one.
    Merge {
        row: String,
        token: ConcurrencyToken,
        columns: Columns,
    },
    /// Write the row unconditionally, replacing any existing contents.
    InsertOrReplace { row: String, columns: Columns },
}

/// Backend acknowledgment for one applied batch entry.
#[derive(Debug, Clone)]
pub struct WriteReceipt {
    /// Token the backend issued for the row after the write.
    pub token: ConcurrencyToken,
}

/// A row read back from the table.
#[derive(Debug, Clone)]
pub struct TableRow {
    /// Row key within the partition.
    pub key: String,
    /// Row contents.
    pub columns: Columns,
    /// Current concurrency token of the row.
    pub token: ConcurrencyToken,
}

/// Per-partition atomic table storage.
#[async_trait]
pub trait StreamTable: Send + Sync {
    /// Apply all writes atomically within one partition.
    ///
    /// Either every write becomes durable or none does. Receipts are
    /// returned in batch order. On failure the error names the first
    /// batch entry that could not be applied.
    async fn execute_batch(
        &self,
        partition: &str,
        writes: Vec<BatchWrite>,
    ) -> Result<Vec<WriteReceipt>>;

    /// Read a single row, or `None` if it does not exist.
    async fn read_row(&self, partition: &str, row: &str) -> Result<Option<TableRow>>;

    /// Read rows with keys in `[from, to]`, ordered by key, at most `limit`.
    async fn query_rows(
        &self,
        partition: &str,
        from: &str,
        to: &str,
        limit: usize,
    ) -> Result<Vec<TableRow>>;
}
