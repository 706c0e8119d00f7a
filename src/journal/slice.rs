//! Bounded runs of events returned by cursor fetches.

use super::event::JournaledEvent;
use super::version::StreamVersion;

/// Ordered, finite sequence of events returned by one fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventStreamSlice {
    from_version: StreamVersion,
    events: Vec<JournaledEvent>,
}

impl EventStreamSlice {
    /// Slice with no events, used before the first fetch and at stream end.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Slice whose first event sits at `from_version`.
    pub fn new(from_version: StreamVersion, events: Vec<JournaledEvent>) -> Self {
        Self {
            from_version,
            events,
        }
    }

    pub fn events(&self) -> &[JournaledEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Version of the first event in the slice.
    pub fn from_version(&self) -> StreamVersion {
        self.from_version
    }

    /// Version of the last event in the slice, or `from_version` when empty.
    pub fn to_version(&self) -> StreamVersion {
        if self.events.is_empty() {
            self.from_version
        } else {
            self.from_version.increment(self.events.len() as u64 - 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_slice_has_no_events() {
        let slice = EventStreamSlice::empty();
        assert!(slice.is_empty());
        assert_eq!(slice.len(), 0);
    }

    #[test]
    fn test_version_bounds() {
        let events = vec![
            JournaledEvent::new("OrderPlaced", &b"{}"[..]),
            JournaledEvent::new("OrderPaid", &b"{}"[..]),
            JournaledEvent::new("OrderShipped", &b"{}"[..]),
        ];
        let slice = EventStreamSlice::new(StreamVersion::new(4), events);
        assert_eq!(slice.from_version(), StreamVersion::new(4));
        assert_eq!(slice.to_version(), StreamVersion::new(6));
    }
}
