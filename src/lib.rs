// src/lib.rs

//! `batchrun`: a bounded-concurrency external-process orchestrator.
//!
//! Given a finite sequence of independent jobs, each mapping to one external
//! command, run up to N jobs concurrently, stream their output live, and
//! collect per-job success/failure into one final report. One job failing
//! never aborts its siblings; only a broken producer, an invalid
//! configuration, or explicit cancellation ends a run early.
//!
//! The caller supplies three collaborators:
//! - a [`JobProducer`](producer::JobProducer): lazy, finite, fallible job
//!   sequence (e.g. a directory listing)
//! - a [`JobExecutor`](executor::JobExecutor): maps each job to the command
//!   that performs it
//! - an [`OutputSink`](sink::OutputSink): receives streamed process output
//!   while jobs run
//!
//! and calls [`run_all`]:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use batchrun::engine::{RunOptions, run_all};
//! use batchrun::executor::TranslationError;
//! use batchrun::job::{CommandSpec, Job};
//! use batchrun::producer::JobList;
//! use batchrun::sink::TracingSink;
//!
//! # async fn demo() -> batchrun::errors::Result<()> {
//! let jobs = JobList::new(vec![
//!     Job::with_payload("episode-1", "/media/in/1.mov"),
//!     Job::with_payload("episode-2", "/media/in/2.mov"),
//! ]);
//!
//! let executor = |job: &Job| {
//!     let input = job
//!         .payload
//!         .as_deref()
//!         .ok_or_else(|| TranslationError(format!("job {} has no input path", job.id)))?;
//!     Ok(CommandSpec::new("transcode").arg("--input").arg(input))
//! };
//!
//! let report = run_all(jobs, &executor, Arc::new(TracingSink), RunOptions::new(4)).await?;
//! assert!(report.all_succeeded());
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod executor;
pub mod job;
pub mod limiter;
pub mod logging;
pub mod producer;
pub mod sink;

pub use cancel::{CancelHandle, CancelSignal};
pub use engine::{AggregateReport, FailedJob, RunOptions, run_all, run_all_with};
pub use errors::{BatchError, Result};
pub use job::{CommandSpec, FailureReason, Job, JobId, RunOutcome};
