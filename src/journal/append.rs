//! Optimistic-concurrency append of an event batch.

use std::sync::Arc;

use tracing::debug;

use crate::storage::{BatchStatusCode, BatchWrite, StreamTable, TableError};

use super::event::JournaledEvent;
use super::schema;
use super::version::{EventStreamHeader, StreamVersion};
use super::{JournalError, Result};

/// Commits a batch of events to a stream under optimistic concurrency.
///
/// Single-use: `prepare` stages the batch, `execute` submits it exactly
/// once. The head record update goes first in the batch: an insert for a
/// new stream, a token-guarded merge otherwise. Event rows use
/// unconditional upserts because versions are never reused, so replays of
/// the same batch stay idempotent at the per-event level while the head
/// write alone arbitrates concurrency.
pub struct AppendOperation {
    table: Arc<dyn StreamTable>,
    stream_name: String,
    header: EventStreamHeader,
    prepared: Option<PreparedBatch>,
}

struct PreparedBatch {
    writes: Vec<BatchWrite>,
    /// Position of the head write within `writes`. Recorded when the batch
    /// is built, never re-derived from the batch layout.
    head_index: usize,
    target_version: StreamVersion,
}

impl AppendOperation {
    pub fn new(
        table: Arc<dyn StreamTable>,
        stream_name: impl Into<String>,
        header: EventStreamHeader,
    ) -> Self {
        Self {
            table,
            stream_name: stream_name.into(),
            header,
            prepared: None,
        }
    }

    /// Stage the atomic batch writing `events` after the known header.
    pub fn prepare(&mut self, events: &[JournaledEvent]) {
        let target_version = self.header.version().increment(events.len() as u64);

        let mut writes = Vec::with_capacity(events.len() + 1);
        let head_index = writes.len();
        writes.push(self.head_write(target_version));

        let mut current_version = self.header.version();
        for event in events {
            current_version = current_version.increment(1);
            writes.push(BatchWrite::InsertOrReplace {
                row: schema::event_row_key(current_version),
                columns: event.columns(),
            });
        }

        debug!(
            stream = %self.stream_name,
            events = events.len(),
            target_version = %target_version,
            "Prepared append batch"
        );

        self.prepared = Some(PreparedBatch {
            writes,
            head_index,
            target_version,
        });
    }

    /// Submit the prepared batch and return the stream's new header.
    pub async fn execute(&mut self) -> Result<EventStreamHeader> {
        let Some(prepared) = self.prepared.take() else {
            return Err(JournalError::NotPrepared);
        };

        let receipts = match self
            .table
            .execute_batch(&self.stream_name, prepared.writes)
            .await
        {
            Ok(receipts) => receipts,
            Err(err) => {
                return Err(Self::classify(
                    &self.stream_name,
                    prepared.head_index,
                    err,
                ))
            }
        };

        let token = receipts
            .get(prepared.head_index)
            .map(|receipt| receipt.token.clone())
            .ok_or_else(|| {
                TableError::Unavailable("head receipt missing from batch result".to_string())
            })?;

        Ok(EventStreamHeader::new(token, prepared.target_version))
    }

    fn head_write(&self, target_version: StreamVersion) -> BatchWrite {
        let columns = schema::head_columns(target_version);
        match self.header.token() {
            None => BatchWrite::Insert {
                row: schema::HEAD_ROW.to_string(),
                columns,
            },
            Some(token) => BatchWrite::Merge {
                row: schema::HEAD_ROW.to_string(),
                token: token.clone(),
                columns,
            },
        }
    }

    /// Reclassify a head-write conflict into the concurrency signal callers
    /// retry on; every other backend failure propagates unchanged.
    fn classify(stream_name: &str, head_index: usize, err: TableError) -> JournalError {
        match err {
            TableError::Batch { index, code, .. }
                if index == head_index
                    && matches!(
                        code,
                        BatchStatusCode::Conflict | BatchStatusCode::PreconditionFailed
                    ) =>
            {
                JournalError::StreamConcurrency {
                    stream: stream_name.to_string(),
                }
            }
            other => JournalError::Table(other),
        }
    }
}
