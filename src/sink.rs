// src/sink.rs

//! Output sinks: where streamed process output goes while jobs run.
//!
//! The runner forwards every line it reads to the sink as it arrives, so a
//! caller can watch long-running jobs live. Sinks must not block the runner:
//! [`ChannelSink`] drops lines when its buffer is full rather than stalling
//! the process reader.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::job::JobId;

/// Which pipe a line arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Receives streamed output lines, tagged by job and pipe.
///
/// Called from the runner's reader tasks; implementations must be cheap and
/// must never block indefinitely.
pub trait OutputSink: Send + Sync {
    fn emit(&self, job: &JobId, kind: StreamKind, line: &str);
}

/// One forwarded line, as delivered by [`ChannelSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub job: JobId,
    pub kind: StreamKind,
    pub line: String,
}

/// Default sink: forwards lines into the tracing pipeline.
///
/// stdout at info, stderr at debug, matching how process chatter is usually
/// wanted in logs.
#[derive(Debug, Default)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn emit(&self, job: &JobId, kind: StreamKind, line: &str) {
        match kind {
            StreamKind::Stdout => info!(job = %job, "stdout: {}", line),
            StreamKind::Stderr => debug!(job = %job, "stderr: {}", line),
        }
    }
}

/// Sink that forwards lines over a bounded channel.
///
/// If the receiver falls behind and the buffer fills up, new lines are
/// dropped and counted instead of blocking the runner.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<OutputChunk>,
    dropped: AtomicU64,
}

impl ChannelSink {
    /// Create a sink plus the receiving end for the caller to consume.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<OutputChunk>) {
        let (tx, rx) = mpsc::channel(buffer);
        (
            Self {
                tx,
                dropped: AtomicU64::new(0),
            },
            rx,
        )
    }

    /// Number of lines dropped because the channel was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl OutputSink for ChannelSink {
    fn emit(&self, job: &JobId, kind: StreamKind, line: &str) {
        let chunk = OutputChunk {
            job: job.clone(),
            kind,
            line: line.to_string(),
        };
        if self.tx.try_send(chunk).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit(&self, _job: &JobId, _kind: StreamKind, _line: &str) {}
}
