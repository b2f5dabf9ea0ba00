// tests/sink_channel.rs

//! `ChannelSink` must never block the runner: when its buffer is full, new
//! lines are dropped and counted instead.

use std::error::Error;

use batchrun::sink::{ChannelSink, OutputSink, StreamKind};
use batchrun_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn full_channel_drops_lines_instead_of_blocking() -> TestResult {
    init_tracing();

    // Capacity one and nobody reading: every line past the first overflows.
    let (sink, mut rx) = ChannelSink::new(1);
    let job = "noisy".to_string();

    for i in 0..5 {
        sink.emit(&job, StreamKind::Stdout, &format!("line-{i}"));
    }

    assert_eq!(sink.dropped(), 4);

    let delivered = rx.try_recv()?;
    assert_eq!(delivered.job, "noisy");
    assert_eq!(delivered.kind, StreamKind::Stdout);
    assert_eq!(delivered.line, "line-0");
    assert!(rx.try_recv().is_err(), "only one line fits the buffer");
    Ok(())
}

#[tokio::test]
async fn closed_receiver_counts_drops_too() -> TestResult {
    init_tracing();

    let (sink, rx) = ChannelSink::new(8);
    drop(rx);

    let job = "orphan".to_string();
    sink.emit(&job, StreamKind::Stderr, "nobody listening");
    assert_eq!(sink.dropped(), 1);
    Ok(())
}
