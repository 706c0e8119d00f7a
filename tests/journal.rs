//! End-to-end journal scenarios over the in-memory table.

use std::sync::Arc;

use annal::config::JournalConfig;
use annal::journal::{
    EventJournal, EventStreamHeader, JournalError, JournaledEvent, StreamVersion,
};
use annal::storage::MemoryTable;

fn journal() -> EventJournal {
    EventJournal::new(Arc::new(MemoryTable::new()))
}

fn journal_with_slice_size(slice_size: usize) -> EventJournal {
    EventJournal::with_config(
        Arc::new(MemoryTable::new()),
        &JournalConfig { slice_size },
    )
}

fn events(count: usize) -> Vec<JournaledEvent> {
    (0..count)
        .map(|i| JournaledEvent::new("OrderPlaced", format!("{{\"n\":{i}}}")))
        .collect()
}

#[tokio::test]
async fn test_append_then_append_with_stale_header_conflicts() {
    let journal = journal();

    // New stream: three events land at version 3.
    let v3 = journal
        .append_events("orders-1", EventStreamHeader::NEW_STREAM, &events(3))
        .await
        .unwrap();
    assert_eq!(v3.version(), StreamVersion::new(3));

    // Two more on the returned header: version 5.
    let v5 = journal
        .append_events("orders-1", v3.clone(), &events(2))
        .await
        .unwrap();
    assert_eq!(v5.version(), StreamVersion::new(5));

    // Two more on the original, stale version-3 header: concurrency conflict.
    let err = journal
        .append_events("orders-1", v3, &events(2))
        .await
        .unwrap_err();
    match err {
        JournalError::StreamConcurrency { stream } => assert_eq!(stream, "orders-1"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_losing_append_applies_no_events() {
    let journal = journal();

    let header = journal
        .append_events("orders-1", EventStreamHeader::NEW_STREAM, &events(3))
        .await
        .unwrap();
    journal
        .append_events("orders-1", header, &events(2))
        .await
        .unwrap();

    // A second writer racing with the very first append.
    let err = journal
        .append_events("orders-1", EventStreamHeader::NEW_STREAM, &events(4))
        .await
        .unwrap_err();
    assert!(matches!(err, JournalError::StreamConcurrency { .. }));

    // The journal still holds exactly the five committed events.
    let mut cursor = journal
        .open_cursor("orders-1", StreamVersion::START)
        .await
        .unwrap();
    let mut total = 0;
    while !cursor.end_of_stream() {
        cursor.fetch_slice().await.unwrap();
        total += cursor.slice().unwrap().len();
    }
    assert_eq!(total, 5);
}

#[tokio::test]
async fn test_empty_batch_returns_header_unchanged() {
    let journal = journal();
    let header = journal
        .append_events("orders-1", EventStreamHeader::NEW_STREAM, &[])
        .await
        .unwrap();
    assert!(header.is_new_stream());
    assert_eq!(header.version(), StreamVersion::ZERO);
}

#[tokio::test]
async fn test_reread_header_after_conflict_allows_retry() {
    let journal = journal();

    let stale = journal
        .append_events("orders-1", EventStreamHeader::NEW_STREAM, &events(1))
        .await
        .unwrap();
    journal
        .append_events("orders-1", stale.clone(), &events(1))
        .await
        .unwrap();

    let err = journal
        .append_events("orders-1", stale, &events(1))
        .await
        .unwrap_err();
    assert!(matches!(err, JournalError::StreamConcurrency { .. }));

    // The retry protocol: re-read the head, then append again.
    let fresh = journal.read_stream_header("orders-1").await.unwrap();
    assert_eq!(fresh.version(), StreamVersion::new(2));
    let header = journal
        .append_events("orders-1", fresh, &events(1))
        .await
        .unwrap();
    assert_eq!(header.version(), StreamVersion::new(3));
}

#[tokio::test]
async fn test_cursor_reads_stream_in_slices() {
    let journal = journal_with_slice_size(2);

    let header = journal
        .append_events("orders-1", EventStreamHeader::NEW_STREAM, &events(5))
        .await
        .unwrap();

    let mut cursor = journal
        .open_cursor("orders-1", StreamVersion::START)
        .await
        .unwrap();
    assert!(matches!(
        cursor.slice(),
        Err(JournalError::CursorNotInitialized)
    ));

    let mut sizes = Vec::new();
    while !cursor.end_of_stream() {
        cursor.fetch_slice().await.unwrap();
        sizes.push(cursor.slice().unwrap().len());
    }
    assert_eq!(sizes, vec![2, 2, 1]);
    assert_eq!(cursor.cursor_stream_version(), StreamVersion::START);
    assert_eq!(cursor.stream_version(), header.version());
}

#[tokio::test]
async fn test_cursor_observes_growth_between_fetches() {
    let journal = journal_with_slice_size(2);

    journal
        .append_events("orders-1", EventStreamHeader::NEW_STREAM, &events(3))
        .await
        .unwrap();

    let mut cursor = journal
        .open_cursor("orders-1", StreamVersion::START)
        .await
        .unwrap();
    cursor.fetch_slice().await.unwrap();
    assert_eq!(cursor.stream_version(), StreamVersion::new(3));

    // Another writer advances the stream while the cursor is mid-read.
    let header = journal.read_stream_header("orders-1").await.unwrap();
    journal
        .append_events("orders-1", header, &events(2))
        .await
        .unwrap();

    let mut total = cursor.slice().unwrap().len();
    while !cursor.end_of_stream() {
        cursor.fetch_slice().await.unwrap();
        total += cursor.slice().unwrap().len();
    }
    assert_eq!(total, 5);
    assert_eq!(cursor.stream_version(), StreamVersion::new(5));
    assert_eq!(cursor.cursor_stream_version(), StreamVersion::START);
}

#[tokio::test]
async fn test_cursor_from_middle_of_stream() {
    let journal = journal();

    journal
        .append_events("orders-1", EventStreamHeader::NEW_STREAM, &events(5))
        .await
        .unwrap();

    let mut cursor = journal
        .open_cursor("orders-1", StreamVersion::new(4))
        .await
        .unwrap();
    cursor.fetch_slice().await.unwrap();

    let slice = cursor.slice().unwrap();
    assert_eq!(slice.len(), 2);
    assert_eq!(slice.from_version(), StreamVersion::new(4));
    assert_eq!(slice.to_version(), StreamVersion::new(5));
    assert!(cursor.end_of_stream());
}

#[tokio::test]
async fn test_unwritten_stream_yields_the_empty_cursor() {
    let journal = journal();

    let cursor = journal
        .open_cursor("orders-1", StreamVersion::START)
        .await
        .unwrap();
    assert!(cursor.end_of_stream());
    assert!(cursor.slice().unwrap().is_empty());
}

#[tokio::test]
async fn test_cursor_past_stream_end_yields_the_empty_cursor() {
    let journal = journal();

    journal
        .append_events("orders-1", EventStreamHeader::NEW_STREAM, &events(2))
        .await
        .unwrap();

    let cursor = journal
        .open_cursor("orders-1", StreamVersion::new(3))
        .await
        .unwrap();
    assert!(cursor.end_of_stream());
}

#[tokio::test]
async fn test_payloads_survive_the_round_trip() {
    let journal = journal();

    let committed = vec![
        JournaledEvent::new("OrderPlaced", &b"{\"id\":1}"[..]),
        JournaledEvent::new("OrderPaid", &b"{\"id\":1,\"amount\":10}"[..]),
    ];
    journal
        .append_events("orders-1", EventStreamHeader::NEW_STREAM, &committed)
        .await
        .unwrap();

    let mut cursor = journal
        .open_cursor("orders-1", StreamVersion::START)
        .await
        .unwrap();
    cursor.fetch_slice().await.unwrap();

    let read = cursor.slice().unwrap().events().to_vec();
    assert_eq!(read, committed);
}
