//! Lazy slice-by-slice stream reading.

use std::sync::Arc;

use futures::future::BoxFuture;

use super::slice::EventStreamSlice;
use super::version::{EventStreamHeader, StreamVersion};
use super::{JournalError, Result};

/// Result of one external fetch call.
#[derive(Debug, Clone)]
pub struct FetchedSlice {
    /// Events read by this fetch.
    pub slice: EventStreamSlice,
    /// Stream header as observed by the fetch.
    pub header: EventStreamHeader,
    /// True when the fetch observed the end of the stream.
    pub end_of_stream: bool,
}

/// Async slice producer supplied by the stream reader.
///
/// Invoked with the version of the first event wanted.
pub type FetchEvents =
    Arc<dyn Fn(StreamVersion) -> BoxFuture<'static, Result<FetchedSlice>> + Send + Sync>;

enum CursorState {
    /// Constructed, nothing fetched yet.
    Initial {
        header: EventStreamHeader,
        from_version: StreamVersion,
        fetch: FetchEvents,
    },
    /// At least one slice fetched, more may remain.
    Active {
        header: EventStreamHeader,
        position: StreamVersion,
        fetch: FetchEvents,
    },
    /// Terminal. Further fetches are no-ops.
    EndOfStream { header: EventStreamHeader },
}

/// Reads a stream as a lazily-fetched sequence of slices.
///
/// The cursor's start position is fixed at construction and exposed as
/// `cursor_stream_version`; the header reported by `stream_header` tracks
/// what the most recent fetch observed, so a long-lived cursor notices a
/// stream growing under it.
pub struct EventStreamCursor {
    state: CursorState,
    slice: EventStreamSlice,
    cursor_stream_version: StreamVersion,
}

impl EventStreamCursor {
    pub fn new(
        header: EventStreamHeader,
        from_version: StreamVersion,
        fetch: FetchEvents,
    ) -> Self {
        Self {
            state: CursorState::Initial {
                header,
                from_version,
                fetch,
            },
            slice: EventStreamSlice::empty(),
            cursor_stream_version: from_version,
        }
    }

    /// Cursor representing "nothing to read", end-of-stream from the start.
    pub fn empty() -> Self {
        Self {
            state: CursorState::EndOfStream {
                header: EventStreamHeader::UNKNOWN,
            },
            slice: EventStreamSlice::empty(),
            cursor_stream_version: StreamVersion::ZERO,
        }
    }

    /// Fetch the next slice and advance the cursor state.
    ///
    /// Called past the end of the stream, the state stays terminal and the
    /// slice becomes empty without touching the fetch function.
    pub async fn fetch_slice(&mut self) -> Result<()> {
        let (position, fetch) = match &self.state {
            CursorState::Initial {
                from_version,
                fetch,
                ..
            } => (*from_version, fetch.clone()),
            CursorState::Active {
                position, fetch, ..
            } => (*position, fetch.clone()),
            CursorState::EndOfStream { .. } => {
                self.slice = EventStreamSlice::empty();
                return Ok(());
            }
        };

        let FetchedSlice {
            slice,
            header,
            end_of_stream,
        } = fetch(position).await?;

        let next_position = if slice.is_empty() {
            position
        } else {
            slice.to_version().increment(1)
        };

        self.state = if end_of_stream {
            CursorState::EndOfStream { header }
        } else {
            CursorState::Active {
                header,
                position: next_position,
                fetch,
            }
        };
        self.slice = slice;

        Ok(())
    }

    /// The most recently fetched slice.
    pub fn slice(&self) -> Result<&EventStreamSlice> {
        if matches!(self.state, CursorState::Initial { .. }) {
            return Err(JournalError::CursorNotInitialized);
        }
        Ok(&self.slice)
    }

    /// Stream header as known by the current state.
    pub fn stream_header(&self) -> &EventStreamHeader {
        match &self.state {
            CursorState::Initial { header, .. }
            | CursorState::Active { header, .. }
            | CursorState::EndOfStream { header } => header,
        }
    }

    /// Stream version as known by the current state.
    pub fn stream_version(&self) -> StreamVersion {
        self.stream_header().version()
    }

    /// The start position requested at construction. Never changes.
    pub fn cursor_stream_version(&self) -> StreamVersion {
        self.cursor_stream_version
    }

    pub fn end_of_stream(&self) -> bool {
        matches!(self.state, CursorState::EndOfStream { .. })
    }
}
