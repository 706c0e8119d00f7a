//! Stream positioning and concurrency primitives.

use std::fmt;

/// Monotonically increasing position of the last committed event in a stream.
///
/// Event versions start at 1; version zero identifies a stream with no
/// committed events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamVersion(u64);

impl StreamVersion {
    /// Version of a stream that has never been written.
    pub const ZERO: StreamVersion = StreamVersion(0);

    /// Version of the first event in a stream.
    pub const START: StreamVersion = StreamVersion(1);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns this version advanced by `count`. Never mutates in place.
    pub fn increment(self, count: u64) -> StreamVersion {
        StreamVersion(self.0 + count)
    }
}

impl fmt::Display for StreamVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque concurrency token issued by the table backend for a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcurrencyToken(String);

impl ConcurrencyToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ConcurrencyToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ConcurrencyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Last known write position of a stream and the token guarding its head record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventStreamHeader {
    token: Option<ConcurrencyToken>,
    version: StreamVersion,
}

impl EventStreamHeader {
    /// Header of a stream that has never been written.
    pub const NEW_STREAM: EventStreamHeader = EventStreamHeader {
        token: None,
        version: StreamVersion::ZERO,
    };

    /// Header that has not been resolved yet, used before the first read.
    pub const UNKNOWN: EventStreamHeader = EventStreamHeader {
        token: None,
        version: StreamVersion::ZERO,
    };

    pub fn new(token: ConcurrencyToken, version: StreamVersion) -> Self {
        Self {
            token: Some(token),
            version,
        }
    }

    /// True when the stream has never been written (no backend token).
    pub fn is_new_stream(&self) -> bool {
        self.token.is_none()
    }

    pub fn token(&self) -> Option<&ConcurrencyToken> {
        self.token.as_ref()
    }

    pub fn version(&self) -> StreamVersion {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_is_pure() {
        let version = StreamVersion::new(3);
        assert_eq!(version.increment(2), StreamVersion::new(5));
        assert_eq!(version, StreamVersion::new(3));
    }

    #[test]
    fn test_versions_are_totally_ordered() {
        assert!(StreamVersion::ZERO < StreamVersion::START);
        assert!(StreamVersion::new(2) < StreamVersion::new(10));
    }

    #[test]
    fn test_new_stream_has_no_token() {
        assert!(EventStreamHeader::NEW_STREAM.is_new_stream());
        assert!(EventStreamHeader::UNKNOWN.is_new_stream());

        let written = EventStreamHeader::new(ConcurrencyToken::new("t-1"), StreamVersion::new(1));
        assert!(!written.is_new_stream());
    }
}
