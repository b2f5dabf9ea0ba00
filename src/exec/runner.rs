// src/exec/runner.rs

//! Individual job process runner.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cancel::CancelSignal;
use crate::job::{CommandSpec, FailureReason, JobId, RunOutcome};
use crate::sink::{OutputSink, StreamKind};

/// How a runner invocation ended.
///
/// `Cancelled` deliberately carries no outcome: a cancelled job must never
/// contribute a fabricated success or failure to the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerExit {
    Completed(RunOutcome),
    Cancelled,
}

/// Trait abstracting how one command is run to completion.
///
/// Production code uses [`ProcessRunner`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        job_id: JobId,
        spec: CommandSpec,
        sink: Arc<dyn OutputSink>,
        cancel: CancelSignal,
    ) -> Pin<Box<dyn Future<Output = RunnerExit> + Send + '_>>;
}

/// Real runner: spawns the command as an OS process.
///
/// Both pipes are read line by line as data arrives. Every line is forwarded
/// to the sink immediately and appended to the captured buffer, so a failed
/// job's report contains everything the process said. The child is spawned
/// with `kill_on_drop` so no exit path leaks a process handle.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessRunner {
    fn run(
        &self,
        job_id: JobId,
        spec: CommandSpec,
        sink: Arc<dyn OutputSink>,
        cancel: CancelSignal,
    ) -> Pin<Box<dyn Future<Output = RunnerExit> + Send + '_>> {
        Box::pin(run_process(job_id, spec, sink, cancel))
    }
}

async fn run_process(
    job_id: JobId,
    spec: CommandSpec,
    sink: Arc<dyn OutputSink>,
    mut cancel: CancelSignal,
) -> RunnerExit {
    info!(job = %job_id, cmd = %spec, "starting job process");

    let mut cmd = Command::new(spec.program());
    cmd.args(spec.arg_list())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            warn!(job = %job_id, error = %err, "failed to launch process");
            return RunnerExit::Completed(RunOutcome::Failure {
                exit_code: None,
                output: String::new(),
                reason: FailureReason::Launch(format!("{}: {err}", spec.program())),
            });
        }
    };

    let captured = Arc::new(Mutex::new(String::new()));

    let stdout_reader = child
        .stdout
        .take()
        .map(|out| spawn_line_reader(out, StreamKind::Stdout, &job_id, &sink, &captured));
    let stderr_reader = child
        .stderr
        .take()
        .map(|err| spawn_line_reader(err, StreamKind::Stderr, &job_id, &sink, &captured));

    // Either the process exits on its own (normal case), or the run is
    // cancelled and we kill it. The readers drain naturally once the pipes
    // close, in both cases.
    let status = tokio::select! {
        status_res = child.wait() => match status_res {
            Ok(status) => status,
            Err(err) => {
                warn!(job = %job_id, error = %err, "failed to wait for process");
                let _ = child.start_kill();
                drain_readers(stdout_reader, stderr_reader).await;
                let output = take_captured(&captured);
                return RunnerExit::Completed(RunOutcome::Failure {
                    exit_code: None,
                    output,
                    reason: FailureReason::Launch(format!("wait failed: {err}")),
                });
            }
        },
        _ = cancel.cancelled() => {
            info!(job = %job_id, "cancellation requested, killing process");
            let _ = child.start_kill();
            let _ = child.wait().await;
            drain_readers(stdout_reader, stderr_reader).await;
            return RunnerExit::Cancelled;
        }
    };

    drain_readers(stdout_reader, stderr_reader).await;
    let output = take_captured(&captured);

    let code = status.code().unwrap_or(-1);
    info!(
        job = %job_id,
        exit_code = code,
        success = status.success(),
        "job process exited"
    );

    let outcome = if status.success() {
        RunOutcome::Success { output }
    } else {
        RunOutcome::Failure {
            exit_code: Some(code),
            output,
            reason: FailureReason::NonZeroExit(code),
        }
    };

    RunnerExit::Completed(outcome)
}

/// Read one pipe line by line, forwarding each line to the sink and
/// appending it to the shared capture buffer.
fn spawn_line_reader<R>(
    pipe: R,
    kind: StreamKind,
    job_id: &JobId,
    sink: &Arc<dyn OutputSink>,
    captured: &Arc<Mutex<String>>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let job_id = job_id.clone();
    let sink = Arc::clone(sink);
    let captured = Arc::clone(captured);

    tokio::spawn(async move {
        let reader = BufReader::new(pipe);
        let mut lines = reader.lines();

        while let Ok(Some(line)) = lines.next_line().await {
            sink.emit(&job_id, kind, &line);
            let mut buf = captured.lock().unwrap();
            buf.push_str(&line);
            buf.push('\n');
        }
        debug!(job = %job_id, ?kind, "pipe closed");
    })
}

async fn drain_readers(stdout: Option<JoinHandle<()>>, stderr: Option<JoinHandle<()>>) {
    if let Some(handle) = stdout {
        let _ = handle.await;
    }
    if let Some(handle) = stderr {
        let _ = handle.await;
    }
}

fn take_captured(captured: &Arc<Mutex<String>>) -> String {
    std::mem::take(&mut *captured.lock().unwrap())
}
