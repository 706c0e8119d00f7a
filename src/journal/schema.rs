//! Table layout of a stream's journal partition.
//!
//! A stream maps to one partition: a single `HEAD` row carrying the current
//! version under the backend's concurrency token, and one row per event
//! keyed by the event's zero-padded version. Zero-padding keeps the
//! backend's lexicographic key order identical to numeric version order.

use bytes::Bytes;

use crate::storage::{ColumnValue, Columns};

use super::event::JournaledEvent;
use super::version::StreamVersion;

pub(crate) const HEAD_ROW: &str = "HEAD";

pub(crate) const COL_VERSION: &str = "Version";
pub(crate) const COL_EVENT_TYPE: &str = "EventType";
pub(crate) const COL_PAYLOAD: &str = "Payload";

/// Row key of the event committed at `version`.
pub(crate) fn event_row_key(version: StreamVersion) -> String {
    format!("{:020}", version.value())
}

pub(crate) fn version_from_row_key(key: &str) -> Option<StreamVersion> {
    key.parse::<u64>().ok().map(StreamVersion::new)
}

pub(crate) fn head_columns(version: StreamVersion) -> Columns {
    let mut columns = Columns::new();
    columns.insert(
        COL_VERSION.to_string(),
        ColumnValue::Integer(version.value() as i64),
    );
    columns
}

pub(crate) fn event_columns(event: &JournaledEvent) -> Columns {
    let mut columns = Columns::new();
    columns.insert(
        COL_EVENT_TYPE.to_string(),
        ColumnValue::Text(event.event_type().to_string()),
    );
    columns.insert(
        COL_PAYLOAD.to_string(),
        ColumnValue::Binary(event.payload().clone()),
    );
    columns
}

pub(crate) fn version_from_columns(columns: &Columns) -> Option<StreamVersion> {
    match columns.get(COL_VERSION) {
        Some(ColumnValue::Integer(value)) if *value >= 0 => {
            Some(StreamVersion::new(*value as u64))
        }
        _ => None,
    }
}

pub(crate) fn event_from_columns(columns: &Columns) -> Option<JournaledEvent> {
    let event_type = match columns.get(COL_EVENT_TYPE) {
        Some(ColumnValue::Text(value)) => value.clone(),
        _ => return None,
    };
    let payload = match columns.get(COL_PAYLOAD) {
        Some(ColumnValue::Binary(value)) => value.clone(),
        Some(ColumnValue::Text(value)) => Bytes::from(value.clone().into_bytes()),
        _ => return None,
    };
    Some(JournaledEvent::new(event_type, payload))
}
