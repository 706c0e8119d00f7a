//! In-memory table storage for tests and standalone use.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::journal::ConcurrencyToken;

use super::{BatchStatusCode, BatchWrite, Columns, Result, StreamTable, TableError, TableRow, WriteReceipt};

struct StoredRow {
    columns: Columns,
    token: ConcurrencyToken,
}

/// In-memory `StreamTable` implementation.
///
/// Rows are kept per partition in key order. Batches are validated in
/// full before any write is applied, so a failed batch leaves the
/// partition untouched.
#[derive(Default)]
pub struct MemoryTable {
    partitions: RwLock<HashMap<String, BTreeMap<String, StoredRow>>>,
    token_seq: AtomicU64,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_token(&self) -> ConcurrencyToken {
        let seq = self.token_seq.fetch_add(1, Ordering::SeqCst);
        ConcurrencyToken::new(format!("t-{seq:08}"))
    }

    fn validate(
        partition: &BTreeMap<String, StoredRow>,
        writes: &[BatchWrite],
    ) -> Result<()> {
        for (index, write) in writes.iter().enumerate() {
            match write {
                BatchWrite::Insert { row, .. } => {
                    if partition.contains_key(row) {
                        return Err(TableError::Batch {
                            index,
                            code: BatchStatusCode::Conflict,
                            message: format!("row '{row}' already exists"),
                        });
                    }
                }
                BatchWrite::Merge { row, token, .. } => match partition.get(row) {
                    None => {
                        return Err(TableError::Batch {
                            index,
                            code: BatchStatusCode::Other,
                            message: format!("row '{row}' does not exist"),
                        });
                    }
                    Some(stored) if stored.token != *token => {
                        return Err(TableError::Batch {
                            index,
                            code: BatchStatusCode::PreconditionFailed,
                            message: format!("token mismatch for row '{row}'"),
                        });
                    }
                    Some(_) => {}
                },
                BatchWrite::InsertOrReplace { .. } => {}
            }
        }
        Ok(())
    }
}

#[async_trait]
impl StreamTable for MemoryTable {
    async fn execute_batch(
        &self,
        partition: &str,
        writes: Vec<BatchWrite>,
    ) -> Result<Vec<WriteReceipt>> {
        let mut partitions = self.partitions.write().await;
        let rows = partitions.entry(partition.to_string()).or_default();

        Self::validate(rows, &writes)?;

        let mut receipts = Vec::with_capacity(writes.len());
        for write in writes {
            let token = self.next_token();
            match write {
                BatchWrite::Insert { row, columns }
                | BatchWrite::InsertOrReplace { row, columns } => {
                    rows.insert(
                        row,
                        StoredRow {
                            columns,
                            token: token.clone(),
                        },
                    );
                }
                BatchWrite::Merge { row, columns, .. } => {
                    // Validated above; merge columns into the existing row.
                    if let Some(stored) = rows.get_mut(&row) {
                        stored.columns.extend(columns);
                        stored.token = token.clone();
                    }
                }
            }
            receipts.push(WriteReceipt { token });
        }

        debug!(partition = %partition, writes = receipts.len(), "Applied batch");

        Ok(receipts)
    }

    async fn read_row(&self, partition: &str, row: &str) -> Result<Option<TableRow>> {
        let partitions = self.partitions.read().await;
        Ok(partitions.get(partition).and_then(|rows| {
            rows.get(row).map(|stored| TableRow {
                key: row.to_string(),
                columns: stored.columns.clone(),
                token: stored.token.clone(),
            })
        }))
    }

    async fn query_rows(
        &self,
        partition: &str,
        from: &str,
        to: &str,
        limit: usize,
    ) -> Result<Vec<TableRow>> {
        let partitions = self.partitions.read().await;
        let Some(rows) = partitions.get(partition) else {
            return Ok(Vec::new());
        };

        let range = (
            Bound::Included(from.to_string()),
            Bound::Included(to.to_string()),
        );
        Ok(rows
            .range(range)
            .take(limit)
            .map(|(key, stored)| TableRow {
                key: key.clone(),
                columns: stored.columns.clone(),
                token: stored.token.clone(),
            })
            .collect())
    }
}
