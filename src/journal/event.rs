//! Journaled event payloads.

use bytes::Bytes;

use crate::storage::Columns;

use super::schema;

/// An immutable event carried through the journal.
///
/// Events carry no version of their own; a committed event's version is
/// derived from its position in the appended batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournaledEvent {
    event_type: String,
    payload: Bytes,
}

impl JournaledEvent {
    pub fn new(event_type: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            event_type: event_type.into(),
            payload: payload.into(),
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Key/value representation persisted as an event row.
    pub fn columns(&self) -> Columns {
        schema::event_columns(self)
    }
}
