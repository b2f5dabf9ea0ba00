// tests/process_runner.rs

//! Integration tests that spawn real OS processes through `ProcessRunner`.

#![cfg(unix)]

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use batchrun::cancel::CancelHandle;
use batchrun::engine::{RunOptions, run_all};
use batchrun::executor::TranslationError;
use batchrun::job::{CommandSpec, FailureReason, Job};
use batchrun::producer::JobList;
use batchrun::sink::{ChannelSink, NullSink, StreamKind};
use batchrun_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

/// Executor that treats the job payload as a shell snippet.
fn shell_executor(job: &Job) -> Result<CommandSpec, TranslationError> {
    let script = job
        .payload
        .as_deref()
        .ok_or_else(|| TranslationError(format!("job {} has no script", job.id)))?;
    Ok(CommandSpec::new("sh").arg("-c").arg(script))
}

#[tokio::test]
async fn successful_process_output_is_captured_and_forwarded() -> TestResult {
    init_tracing();

    let (sink, mut rx) = ChannelSink::new(64);
    let jobs = JobList::new(vec![Job::with_payload(
        "greeter",
        "echo hello; echo oops 1>&2",
    )]);

    let report = with_timeout(run_all(
        jobs,
        &shell_executor,
        Arc::new(sink),
        RunOptions::new(1),
    ))
    .await?;

    assert_eq!(report.total, 1);
    assert_eq!(report.succeeded, 1);

    let mut stdout_lines = Vec::new();
    let mut stderr_lines = Vec::new();
    while let Ok(chunk) = rx.try_recv() {
        assert_eq!(chunk.job, "greeter");
        match chunk.kind {
            StreamKind::Stdout => stdout_lines.push(chunk.line),
            StreamKind::Stderr => stderr_lines.push(chunk.line),
        }
    }
    assert_eq!(stdout_lines, vec!["hello".to_string()]);
    assert_eq!(stderr_lines, vec!["oops".to_string()]);
    Ok(())
}

#[tokio::test]
async fn nonzero_exit_is_a_failure_with_code_and_output() -> TestResult {
    init_tracing();

    let jobs = JobList::new(vec![Job::with_payload(
        "doomed",
        "echo before failing; exit 3",
    )]);

    let report = with_timeout(run_all(
        jobs,
        &shell_executor,
        Arc::new(NullSink),
        RunOptions::new(1),
    ))
    .await?;

    assert_eq!(report.failed, 1);
    let failure = &report.failures[0];
    assert_eq!(failure.id, "doomed");
    assert_eq!(failure.reason, FailureReason::NonZeroExit(3));
    assert!(failure.output.contains("before failing"));
    Ok(())
}

#[tokio::test]
async fn missing_executable_is_a_launch_failure() -> TestResult {
    init_tracing();

    fn ghost_executor(_job: &Job) -> Result<CommandSpec, TranslationError> {
        Ok(CommandSpec::new("/nonexistent/definitely-not-a-binary"))
    }
    let jobs = JobList::new(vec![Job::new("ghost")]);

    let report = with_timeout(run_all(
        jobs,
        &ghost_executor,
        Arc::new(NullSink),
        RunOptions::new(1),
    ))
    .await?;

    assert_eq!(report.failed, 1);
    let failure = &report.failures[0];
    assert!(matches!(failure.reason, FailureReason::Launch(_)));
    Ok(())
}

#[tokio::test]
async fn one_failing_process_does_not_stop_the_others() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let marker = dir.path().join("after.txt");
    let jobs = JobList::new(vec![
        Job::with_payload("bad", "exit 1"),
        Job::with_payload("good", format!("echo done > {}", marker.display())),
    ]);

    let report = with_timeout(run_all(
        jobs,
        &shell_executor,
        Arc::new(NullSink),
        RunOptions::new(1),
    ))
    .await?;

    assert_eq!(report.total, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert!(marker.exists(), "job after the failure should have run");
    Ok(())
}

#[tokio::test]
async fn cancellation_kills_inflight_processes() -> TestResult {
    init_tracing();

    let (handle, signal) = CancelHandle::new();
    let jobs = JobList::new(vec![
        Job::with_payload("sleeper-1", "sleep 60"),
        Job::with_payload("sleeper-2", "sleep 60"),
    ]);

    let run = tokio::spawn(run_all(
        jobs,
        &shell_executor,
        Arc::new(NullSink),
        RunOptions::new(2).with_cancel(signal),
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.cancel();

    // 5s budget: if the sleepers were not killed, this would time out.
    let report = with_timeout(run).await??;
    assert!(report.cancelled);
    assert_eq!(report.recorded(), 0);
    Ok(())
}
