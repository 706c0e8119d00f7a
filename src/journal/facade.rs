//! Client facade over a stream table.

use std::cmp;
use std::sync::Arc;

use tracing::debug;

use crate::config::JournalConfig;
use crate::storage::StreamTable;

use super::append::AppendOperation;
use super::cursor::{EventStreamCursor, FetchEvents, FetchedSlice};
use super::event::JournaledEvent;
use super::schema;
use super::slice::EventStreamSlice;
use super::version::{EventStreamHeader, StreamVersion};
use super::{JournalError, Result};

/// Entry point for journal reads and writes.
///
/// Owns the table handle and produces the fetch functions stream cursors
/// run on.
pub struct EventJournal {
    table: Arc<dyn StreamTable>,
    slice_size: usize,
}

impl EventJournal {
    pub fn new(table: Arc<dyn StreamTable>) -> Self {
        Self::with_config(table, &JournalConfig::default())
    }

    pub fn with_config(table: Arc<dyn StreamTable>, config: &JournalConfig) -> Self {
        Self {
            table,
            slice_size: cmp::max(config.slice_size, 1),
        }
    }

    /// Read the stream's head record.
    ///
    /// Returns the new-stream header when the stream has never been written.
    pub async fn read_stream_header(&self, stream_name: &str) -> Result<EventStreamHeader> {
        read_header(&self.table, stream_name).await
    }

    /// Append `events` to the stream after the known `header`.
    ///
    /// Returns the stream's new header on success, or the concurrency
    /// signal when another writer advanced the stream first. An empty
    /// batch returns the given header unchanged.
    pub async fn append_events(
        &self,
        stream_name: &str,
        header: EventStreamHeader,
        events: &[JournaledEvent],
    ) -> Result<EventStreamHeader> {
        if events.is_empty() {
            return Ok(header);
        }

        let mut operation = AppendOperation::new(self.table.clone(), stream_name, header);
        operation.prepare(events);
        operation.execute().await
    }

    /// Open a cursor reading the stream from `from_version` onwards.
    ///
    /// Returns the pre-built empty cursor when the stream has never been
    /// written or holds nothing at or past `from_version`.
    pub async fn open_cursor(
        &self,
        stream_name: &str,
        from_version: StreamVersion,
    ) -> Result<EventStreamCursor> {
        let header = self.read_stream_header(stream_name).await?;
        if header.is_new_stream() || header.version() < from_version {
            debug!(stream = %stream_name, from_version = %from_version, "Nothing to read");
            return Ok(EventStreamCursor::empty());
        }

        let from_version = cmp::max(from_version, StreamVersion::START);
        let fetch = self.fetch_fn(stream_name.to_string());
        Ok(EventStreamCursor::new(header, from_version, fetch))
    }

    fn fetch_fn(&self, stream_name: String) -> FetchEvents {
        let table = self.table.clone();
        let slice_size = self.slice_size;
        Arc::new(move |from: StreamVersion| {
            let table = table.clone();
            let stream_name = stream_name.clone();
            Box::pin(async move {
                let header = read_header(&table, &stream_name).await?;
                if header.version() < from {
                    return Ok(FetchedSlice {
                        slice: EventStreamSlice::empty(),
                        header,
                        end_of_stream: true,
                    });
                }

                let to = cmp::min(
                    header.version(),
                    from.increment(slice_size as u64 - 1),
                );
                let rows = table
                    .query_rows(
                        &stream_name,
                        &schema::event_row_key(from),
                        &schema::event_row_key(to),
                        slice_size,
                    )
                    .await?;

                let mut slice_from = from;
                let mut events = Vec::with_capacity(rows.len());
                for row in &rows {
                    if events.is_empty() {
                        slice_from = schema::version_from_row_key(&row.key)
                            .unwrap_or(from);
                    }
                    let event = schema::event_from_columns(&row.columns).ok_or_else(|| {
                        JournalError::CorruptRow {
                            stream: stream_name.clone(),
                            row: row.key.clone(),
                        }
                    })?;
                    events.push(event);
                }

                let end_of_stream = events.is_empty() || to >= header.version();
                let slice = EventStreamSlice::new(slice_from, events);

                debug!(
                    stream = %stream_name,
                    from = %from,
                    events = slice.len(),
                    end_of_stream,
                    "Fetched slice"
                );

                Ok(FetchedSlice {
                    slice,
                    header,
                    end_of_stream,
                })
            })
        })
    }
}

async fn read_header(
    table: &Arc<dyn StreamTable>,
    stream_name: &str,
) -> Result<EventStreamHeader> {
    match table.read_row(stream_name, schema::HEAD_ROW).await? {
        None => Ok(EventStreamHeader::NEW_STREAM),
        Some(row) => {
            let version = schema::version_from_columns(&row.columns).ok_or_else(|| {
                JournalError::CorruptRow {
                    stream: stream_name.to_string(),
                    row: row.key,
                }
            })?;
            Ok(EventStreamHeader::new(row.token, version))
        }
    }
}
