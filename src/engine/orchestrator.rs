// src/engine/orchestrator.rs

//! The orchestration loop: producer -> limiter -> runner -> aggregator.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::cancel::{CancelHandle, CancelSignal};
use crate::engine::report::{AggregateReport, Aggregator};
use crate::errors::{BatchError, Result};
use crate::exec::{CommandRunner, ProcessRunner, RunnerExit};
use crate::executor::JobExecutor;
use crate::job::{FailureReason, RunOutcome};
use crate::limiter::{AcquireError, ConcurrencyLimiter};
use crate::producer::JobProducer;
use crate::sink::OutputSink;

/// Options for one orchestration run.
#[derive(Debug)]
pub struct RunOptions {
    /// Upper bound on concurrently running jobs. Must be at least 1.
    pub max_concurrency: usize,
    /// Caller-triggered cancellation, if any.
    pub cancel: Option<CancelSignal>,
}

impl RunOptions {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Run every job the producer yields, at most `max_concurrency` at a time,
/// spawning real OS processes. The sole entry point for production callers.
///
/// Returns `Err` only for run-level setup failures (invalid concurrency,
/// producer failure). Per-job failures are recorded in the report; a
/// cancelled run still returns its partial report, tagged `cancelled`.
pub async fn run_all<P, E>(
    producer: P,
    executor: &E,
    sink: Arc<dyn OutputSink>,
    options: RunOptions,
) -> Result<AggregateReport>
where
    P: JobProducer,
    E: JobExecutor + ?Sized,
{
    run_all_with(Arc::new(ProcessRunner::new()), producer, executor, sink, options).await
}

/// Like [`run_all`], but with an explicit [`CommandRunner`].
///
/// This is the seam tests use to orchestrate fake runners; production code
/// normally goes through [`run_all`].
pub async fn run_all_with<P, E>(
    runner: Arc<dyn CommandRunner>,
    mut producer: P,
    executor: &E,
    sink: Arc<dyn OutputSink>,
    options: RunOptions,
) -> Result<AggregateReport>
where
    P: JobProducer,
    E: JobExecutor + ?Sized,
{
    if options.max_concurrency == 0 {
        return Err(BatchError::InvalidConcurrency(0));
    }

    info!(
        max_concurrency = options.max_concurrency,
        "orchestration run started"
    );

    // One internal cancel fan-out per run. The caller's signal (if any) is
    // forwarded into it; a producer failure also fires it so in-flight
    // processes are killed rather than orphaned.
    let (run_cancel, run_signal) = CancelHandle::new();
    let run_cancel = Arc::new(run_cancel);
    let forwarder = options.cancel.map(|mut caller_signal| {
        // An already-fired signal must stop admission before the first job,
        // not whenever the forwarder task first gets polled.
        if caller_signal.is_cancelled() {
            run_cancel.cancel();
        }
        let run_cancel = Arc::clone(&run_cancel);
        tokio::spawn(async move {
            caller_signal.cancelled().await;
            run_cancel.cancel();
        })
    });

    let limiter = ConcurrencyLimiter::new(options.max_concurrency);
    let aggregator = Aggregator::new();
    let mut tasks: JoinSet<()> = JoinSet::new();
    let mut dispatch_signal = run_signal.clone();

    let mut producer_error: Option<BatchError> = None;

    loop {
        let job = match producer.next_job() {
            Ok(Some(job)) => job,
            Ok(None) => break,
            Err(err) => {
                error!(error = %err, "job producer failed; aborting run");
                run_cancel.cancel();
                producer_error = Some(BatchError::Producer(err));
                break;
            }
        };

        aggregator.job_produced();
        debug!(job = %job.id, "job produced");

        // Sole backpressure point: wait here until a slot frees up.
        let permit = match limiter.acquire(&mut dispatch_signal).await {
            Ok(permit) => permit,
            Err(AcquireError::Cancelled) => {
                info!(job = %job.id, "run cancelled while waiting for a slot");
                break;
            }
        };
        debug!(job = %job.id, in_flight = limiter.in_flight(), "job admitted");

        // Translation failures are per-job: record and move on, the slot is
        // released immediately.
        let spec = match executor.build_command(&job) {
            Ok(spec) => spec,
            Err(err) => {
                warn!(job = %job.id, error = %err, "executor could not build command");
                aggregator.record(
                    &job.id,
                    &RunOutcome::Failure {
                        exit_code: None,
                        output: String::new(),
                        reason: FailureReason::Translation(err.to_string()),
                    },
                );
                drop(permit);
                continue;
            }
        };

        let runner = Arc::clone(&runner);
        let sink = Arc::clone(&sink);
        let aggregator = aggregator.clone();
        let job_signal = run_signal.clone();
        let job_id = job.id;

        tasks.spawn(async move {
            let exit = runner.run(job_id.clone(), spec, sink, job_signal).await;
            match exit {
                RunnerExit::Completed(outcome) => aggregator.record(&job_id, &outcome),
                RunnerExit::Cancelled => {
                    debug!(job = %job_id, "job cancelled before completion; not recorded")
                }
            }
            // Slot released here, waking the longest-waiting acquirer.
            drop(permit);
        });
    }

    // Every spawned job either completes naturally or observes cancellation
    // and kills its process; either way join_next terminates.
    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            error!(error = %err, "job task panicked");
        }
    }

    if let Some(handle) = forwarder {
        handle.abort();
    }

    if let Some(err) = producer_error {
        return Err(err);
    }

    // A cancel that lands after the last job already recorded changed
    // nothing; only tag the report when some job was actually cut short.
    // A job refused admission is covered too: it was counted as produced
    // but never records.
    let cancelled = dispatch_signal.is_cancelled() && !aggregator.is_complete();
    let report = aggregator.finalize(cancelled);
    info!(
        total = report.total,
        succeeded = report.succeeded,
        failed = report.failed,
        cancelled = report.cancelled,
        "orchestration run finished"
    );
    Ok(report)
}
