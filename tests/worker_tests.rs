mod common;

use std::time::{Duration, Instant};

use common::{
    batched_records, collect_messages, file_source, ndjson_lines, serve_once, serve_stalled,
    serve_truncated, write_temp_log,
};
use logscope::log::LogSource;
use logscope::worker::{IngestionWorker, WorkerConfig, WorkerMessage};

fn small_config() -> WorkerConfig {
    WorkerConfig {
        chunk_size: 256,
        parse_batch_size: 7,
        batch_size: 50,
        flush_interval: Duration::from_millis(20),
        read_timeout: Duration::from_millis(50),
    }
}

fn assert_gap_free(records: &[logscope::log::LogRecord]) {
    for (i, record) in records.iter().enumerate() {
        assert!(record.event().ends_with(&format!("\"line {}\"}}", i)), "record {i}");
    }
}

#[tokio::test]
async fn test_worker_delivers_everything_then_end_of_stream() {
    let file = write_temp_log(&ndjson_lines(1234));

    let mut worker = IngestionWorker::spawn(small_config());
    worker.start(file_source(&file));
    let messages = collect_messages(&mut worker).await;

    assert_eq!(
        messages.last(),
        Some(&WorkerMessage::EndOfStream { total: 1234 })
    );
    let records = batched_records(&messages);
    assert_eq!(records.len(), 1234);
    assert_gap_free(&records);
    for message in &messages {
        if let WorkerMessage::Batch(batch) = message {
            assert!(!batch.is_empty() && batch.len() <= 50);
        }
    }

    // Nothing follows the end of the stream
    worker.shutdown().await;
    assert!(worker.try_recv().is_none());
    assert!(worker.is_finished());
}

#[tokio::test]
async fn test_worker_reports_http_failure() {
    let url = serve_once("500 Internal Server Error", "oops");

    let mut worker = IngestionWorker::spawn(small_config());
    worker.start(LogSource::parse(&url));
    let messages = collect_messages(&mut worker).await;

    match messages.as_slice() {
        [WorkerMessage::Error(message)] => assert!(message.contains("500"), "{message}"),
        other => panic!("expected a single error, got {other:?}"),
    }
    worker.shutdown().await;
}

#[tokio::test]
async fn test_worker_reports_missing_file() {
    let mut worker = IngestionWorker::spawn(WorkerConfig::default());
    worker.start(LogSource::parse("/definitely/not/here.ndjson"));
    let messages = collect_messages(&mut worker).await;

    assert!(matches!(messages.as_slice(), [WorkerMessage::Error(_)]));
    worker.shutdown().await;
}

#[tokio::test]
async fn test_empty_source_ends_with_zero_total() {
    let file = write_temp_log("");

    let mut worker = IngestionWorker::spawn(WorkerConfig::default());
    worker.start(file_source(&file));
    let messages = collect_messages(&mut worker).await;

    assert_eq!(messages, vec![WorkerMessage::EndOfStream { total: 0 }]);
    worker.shutdown().await;
}

#[tokio::test]
async fn test_second_start_is_ignored() {
    let first = write_temp_log(&ndjson_lines(3));
    let second = write_temp_log(&ndjson_lines(500));

    let mut worker = IngestionWorker::spawn(WorkerConfig::default());
    worker.start(file_source(&first));
    worker.start(file_source(&second));
    let messages = collect_messages(&mut worker).await;

    assert_eq!(batched_records(&messages).len(), 3);
    assert_eq!(
        messages.last(),
        Some(&WorkerMessage::EndOfStream { total: 3 })
    );
    worker.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_stops_delivery() {
    let file = write_temp_log(&ndjson_lines(20_000));

    let mut worker = IngestionWorker::spawn(small_config());
    worker.start(file_source(&file));

    // Wait for the first batch, then stop mid-stream
    let first = worker.recv().await;
    assert!(matches!(first, Some(WorkerMessage::Batch(_))));
    worker.shutdown().await;

    let mut received = match first {
        Some(WorkerMessage::Batch(batch)) => batch,
        _ => Vec::new(),
    };
    while let Some(message) = worker.try_recv() {
        match message {
            WorkerMessage::Batch(batch) => received.extend(batch),
            WorkerMessage::EndOfStream { total } => assert_eq!(total as usize, received.len()),
            WorkerMessage::Error(message) => panic!("unexpected error: {message}"),
        }
    }

    // Whatever arrived is a gap-free prefix of the source
    assert_gap_free(&received);
    assert!(worker.is_finished());
    assert!(worker.recv().await.is_none());
}

#[tokio::test]
async fn test_failure_mid_stream_flushes_then_reports_once() {
    let mut body = ndjson_lines(30);
    body.push_str("{\"_time\":1724323576626,\"message\":\"cut");
    let url = serve_truncated(&body, 100);

    let mut worker = IngestionWorker::spawn(small_config());
    worker.start(LogSource::parse(&url));
    let messages = collect_messages(&mut worker).await;

    // Every complete line arrives before the single error
    let records = batched_records(&messages);
    assert_eq!(records.len(), 30);
    assert_gap_free(&records);
    match messages.last() {
        Some(WorkerMessage::Error(message)) => assert!(message.contains(&url), "{message}"),
        other => panic!("expected a trailing error, got {other:?}"),
    }
    let terminal = messages
        .iter()
        .filter(|m| !matches!(m, WorkerMessage::Batch(_)))
        .count();
    assert_eq!(terminal, 1);

    worker.shutdown().await;
    assert!(worker.try_recv().is_none());
}

#[tokio::test]
async fn test_shutdown_flushes_records_still_buffered() {
    let (url, _closed) = serve_stalled(&ndjson_lines(40));

    // One-byte windows and one-record parser batches put every complete
    // line in the worker buffer; the hour-long timer never fires
    let mut worker = IngestionWorker::spawn(WorkerConfig {
        chunk_size: 1,
        parse_batch_size: 1,
        batch_size: 1000,
        flush_interval: Duration::from_secs(3600),
        read_timeout: Duration::from_millis(50),
    });
    worker.start(LogSource::parse(&url));

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(worker.try_recv().is_none());

    worker.shutdown().await;
    let mut messages = Vec::new();
    while let Some(message) = worker.try_recv() {
        messages.push(message);
    }

    assert_eq!(messages.len(), 1, "{messages:?}");
    let records = batched_records(&messages);
    assert_eq!(records.len(), 40);
    assert_gap_free(&records);
    assert!(worker.recv().await.is_none());
}

#[test]
fn test_shutdown_releases_stalled_source() {
    let (url, closed) = serve_stalled(&ndjson_lines(3));
    let runtime = tokio::runtime::Runtime::new().unwrap();

    let started = Instant::now();
    runtime.block_on(async {
        let mut worker = IngestionWorker::spawn(small_config());
        worker.start(LogSource::parse(&url));
        tokio::time::sleep(Duration::from_millis(300)).await;
        worker.shutdown().await;
    });
    // Dropping the runtime waits for the blocking reader
    drop(runtime);

    assert!(
        started.elapsed() < Duration::from_secs(5),
        "teardown took {:?}",
        started.elapsed()
    );
    closed
        .recv_timeout(Duration::from_secs(5))
        .expect("connection left open after shutdown");
}
