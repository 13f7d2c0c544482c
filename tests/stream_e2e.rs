//! End-to-end tests for the streaming engine
//!
//! These tests drive full streams through the public API against an in-memory archive
//! and a mock HTTP server, verifying:
//! - Ordered, gap-free delivery under parallel out-of-order completion
//! - Cursor following when the server answers in short pages
//! - Failure delivery on the error queue
//! - HTTP error surfacing through `Client::stream`
//!
//! # Running the tests
//!
//! ```bash
//! cargo test --test stream_e2e
//! ```

mod common;

use common::{ScriptedArchive, consume};
use hypersync_stream::{
    Client, ClientConfig, Error, Query, RetryConfig, Stream, StreamConfig, StreamState, presets,
};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Later sub-ranges finish first, so reassembly has to reorder
fn reversed_latency(from_block: u64) -> Duration {
    Duration::from_millis(40u64.saturating_sub((from_block / 25) % 8 * 5))
}

fn range(from: u64, to: u64) -> Query {
    Query {
        from_block: from,
        to_block: Some(to),
        include_all_blocks: true,
        ..Query::default()
    }
}

#[tokio::test]
async fn test_parallel_stream_is_ordered_and_complete() {
    let archive = Arc::new(ScriptedArchive::new(10_000, 9).with_latency(reversed_latency));
    let config = StreamConfig {
        concurrency: 8,
        batch_size: 25,
        ..StreamConfig::default()
    };

    let mut stream = Stream::new(archive.clone(), range(1_000, 2_000), config).unwrap();
    stream.start().await.unwrap();
    let (blocks, error) = consume(&mut stream).await;

    assert!(error.is_none(), "unexpected stream error: {error:?}");
    assert_eq!(blocks, (1_000..2_000).collect::<Vec<_>>());
    assert_eq!(stream.state(), StreamState::Completed);
    assert!(
        archive.calls().iter().all(|r| r.start >= 1_000 && r.end <= 2_000),
        "no request leaves the queried range"
    );
}

#[tokio::test]
async fn test_open_ended_stream_stops_at_archive_height() {
    let archive = Arc::new(ScriptedArchive::new(500, 40));
    let query = Query {
        from_block: 100,
        include_all_blocks: true,
        ..Query::default()
    };

    let mut stream =
        Stream::new(archive.clone(), query, StreamConfig::with_batch_size(50)).unwrap();
    stream.start().await.unwrap();
    let (blocks, error) = consume(&mut stream).await;

    assert!(error.is_none());
    assert_eq!(blocks.first(), Some(&100));
    assert_eq!(blocks.last(), Some(&499));
    assert_eq!(blocks.len(), 400);
}

#[tokio::test]
async fn test_batch_size_resized_mid_stream() {
    let archive = Arc::new(ScriptedArchive::new(10_000, 10).with_latency(|_| Duration::from_millis(2)));
    let config = StreamConfig {
        concurrency: 2,
        batch_size: 10,
        ..StreamConfig::default()
    };

    let mut stream = Stream::new(archive.clone(), range(0, 1_000), config).unwrap();
    let handle = stream.batch_size_handle();
    stream.start().await.unwrap();

    let resizer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.store(100, Ordering::Relaxed);
    });

    let (blocks, error) = consume(&mut stream).await;
    resizer.await.unwrap();

    assert!(error.is_none());
    assert_eq!(blocks, (0..1_000).collect::<Vec<_>>());
    assert!(
        archive.calls().iter().any(|r| r.end - r.start == 100),
        "later sub-ranges use the new size"
    );
}

#[tokio::test]
async fn test_failure_is_delivered_after_preceding_records() {
    let archive = Arc::new(ScriptedArchive::new(10_000, 50).poisoned_at(300));
    let config = StreamConfig {
        concurrency: 4,
        batch_size: 50,
        ..StreamConfig::default()
    };

    let mut stream = Stream::new(archive, range(0, 1_000), config).unwrap();
    stream.start().await.unwrap();
    let (blocks, error) = consume(&mut stream).await;

    assert_eq!(blocks, (0..300).collect::<Vec<_>>());
    match error {
        Some(Error::Http { status, body }) => {
            assert_eq!(status, 400);
            assert!(body.contains("300"));
        }
        other => panic!("expected Http error, got {other:?}"),
    }
    assert_eq!(stream.state(), StreamState::Failed);
}

#[tokio::test]
async fn test_unsubscribe_mid_stream() {
    let archive = Arc::new(
        ScriptedArchive::new(1_000_000, 10).with_latency(|_| Duration::from_millis(20)),
    );
    let config = StreamConfig {
        concurrency: 4,
        batch_size: 10,
        ..StreamConfig::default()
    };

    let mut stream = Stream::new(archive, range(0, 1_000_000), config).unwrap();
    stream.start().await.unwrap();

    let first = stream.channel().recv().await.expect("priming record");
    assert_eq!(first.next_block, 10);
    stream.ack();

    tokio::time::timeout(Duration::from_secs(5), stream.unsubscribe())
        .await
        .expect("unsubscribe should not hang");

    assert_eq!(stream.state(), StreamState::Cancelled);
    assert!(stream.done_signal().is_fired());
}

#[tokio::test]
async fn test_client_stream_surfaces_rejected_query() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query/arrow-ipc"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid field selection"))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(ClientConfig {
        url: Url::parse(&server.uri()).unwrap(),
        retry: RetryConfig {
            max_num_retries: 3,
            retry_base_ms: 1,
            retry_backoff_ms: 1,
            retry_ceiling_ms: 2,
        },
        ..ClientConfig::default()
    })
    .unwrap();

    let result = client
        .stream(presets::blocks_in_range(0, 99), StreamConfig::default())
        .await;

    match result {
        Err(Error::Http { status, body }) => {
            assert_eq!(status, 400);
            assert_eq!(body, "invalid field selection");
        }
        Err(other) => panic!("expected Http error, got {other:?}"),
        Ok(_) => panic!("stream should not start"),
    }
}
