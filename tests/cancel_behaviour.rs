// tests/cancel_behaviour.rs

//! Cancelling a run stops admission, unblocks waiters, and never fabricates
//! outcomes for jobs that had not finished.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use batchrun::cancel::CancelHandle;
use batchrun::engine::{RunOptions, run_all_with};
use batchrun::exec::CommandRunner;
use batchrun::sink::NullSink;
use batchrun_test_utils::builders::{echo_executor, numbered_jobs};
use batchrun_test_utils::fake_runner::FakeRunner;
use batchrun_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn cancel_mid_run_returns_partial_report_without_hanging() -> TestResult {
    init_tracing();

    let (handle, signal) = CancelHandle::new();
    // Jobs sleep far longer than the test timeout; only cancellation can
    // bring the run back.
    let runner = Arc::new(FakeRunner::new().with_delay(Duration::from_secs(60)));

    let run = tokio::spawn(run_all_with(
        Arc::clone(&runner) as Arc<dyn CommandRunner>,
        numbered_jobs(6),
        &echo_executor,
        Arc::new(NullSink),
        RunOptions::new(2).with_cancel(signal),
    ));

    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.cancel();

    let report = with_timeout(run).await??;

    assert!(report.cancelled);
    // Nothing finished, so nothing may be recorded.
    assert_eq!(report.recorded(), runner.executed().len());
    assert_eq!(report.succeeded, 0);
    assert_eq!(report.failed, 0);
    assert!(report.recorded() <= report.total);
    Ok(())
}

#[tokio::test]
async fn cancel_before_admission_admits_no_jobs() -> TestResult {
    init_tracing();

    let (handle, signal) = CancelHandle::new();
    handle.cancel();

    let runner = Arc::new(FakeRunner::new());
    let report = with_timeout(run_all_with(
        Arc::clone(&runner) as Arc<dyn CommandRunner>,
        numbered_jobs(4),
        &echo_executor,
        Arc::new(NullSink),
        RunOptions::new(2).with_cancel(signal),
    ))
    .await?;

    assert!(report.cancelled);
    assert_eq!(report.recorded(), 0);
    assert!(runner.executed().is_empty());
    Ok(())
}

#[tokio::test]
async fn cancel_after_last_completion_leaves_report_complete() -> TestResult {
    init_tracing();

    let (handle, signal) = CancelHandle::new();
    let runner = Arc::new(FakeRunner::new().with_delay(Duration::from_millis(10)));

    let run = tokio::spawn(run_all_with(
        Arc::clone(&runner) as Arc<dyn CommandRunner>,
        numbered_jobs(3),
        &echo_executor,
        Arc::new(NullSink),
        RunOptions::new(3).with_cancel(signal),
    ));

    // Fire cancellation only once every job has finished running. Nothing
    // was cut short, so the report must not be tagged as cancelled.
    {
        let runner = Arc::clone(&runner);
        tokio::spawn(async move {
            while runner.executed().len() < 3 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            handle.cancel();
        });
    }

    let report = with_timeout(run).await??;
    assert_eq!(report.total, 3);
    assert_eq!(report.recorded(), 3);
    assert!(!report.cancelled);
    Ok(())
}

#[tokio::test]
async fn cancel_racing_natural_completion_does_not_deadlock() -> TestResult {
    init_tracing();

    // Fast jobs plus an immediate cancel: whichever way each race lands, the
    // run must return, and only completed jobs may be recorded.
    let (handle, signal) = CancelHandle::new();
    let runner = Arc::new(FakeRunner::new().with_delay(Duration::from_millis(1)));

    let run = tokio::spawn(run_all_with(
        Arc::clone(&runner) as Arc<dyn CommandRunner>,
        numbered_jobs(20),
        &echo_executor,
        Arc::new(NullSink),
        RunOptions::new(4).with_cancel(signal),
    ));

    tokio::time::sleep(Duration::from_millis(5)).await;
    handle.cancel();

    let report = with_timeout(run).await??;
    assert_eq!(report.recorded(), runner.executed().len());
    assert!(report.recorded() <= report.total);
    Ok(())
}
