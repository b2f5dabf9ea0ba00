use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use batchrun::cancel::CancelSignal;
use batchrun::exec::{CommandRunner, RunnerExit};
use batchrun::job::{CommandSpec, FailureReason, JobId, RunOutcome};
use batchrun::sink::{OutputSink, StreamKind};

/// A fake runner that:
/// - never spawns a process
/// - resolves each job to a scripted outcome (default: success)
/// - optionally sleeps per job, so tests can hold jobs "in flight"
/// - records executed job ids and the peak number of concurrent executions
/// - honours cancellation while sleeping, like the real runner does while
///   waiting on a child process.
#[derive(Default)]
pub struct FakeRunner {
    failures: HashMap<JobId, i32>,
    delay: Option<Duration>,
    executed: Arc<Mutex<Vec<JobId>>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script `job_id` to fail with the given exit code.
    pub fn fail_job(mut self, job_id: &str, exit_code: i32) -> Self {
        self.failures.insert(job_id.to_string(), exit_code);
        self
    }

    /// Make every job take `delay` before completing.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Job ids that ran to completion (cancelled jobs are not listed).
    pub fn executed(&self) -> Vec<JobId> {
        self.executed.lock().unwrap().clone()
    }

    /// Highest number of jobs observed running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

impl CommandRunner for FakeRunner {
    fn run(
        &self,
        job_id: JobId,
        spec: CommandSpec,
        sink: Arc<dyn OutputSink>,
        mut cancel: CancelSignal,
    ) -> Pin<Box<dyn Future<Output = RunnerExit> + Send + '_>> {
        let scripted_failure = self.failures.get(&job_id).copied();
        let delay = self.delay;
        let executed = Arc::clone(&self.executed);
        let in_flight = Arc::clone(&self.in_flight);
        let peak = Arc::clone(&self.peak_in_flight);

        Box::pin(async move {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);

            let exit = async {
                if let Some(delay) = delay {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => return RunnerExit::Cancelled,
                    }
                }

                let line = format!("ran {}", spec);
                sink.emit(&job_id, StreamKind::Stdout, &line);
                executed.lock().unwrap().push(job_id.clone());

                let outcome = match scripted_failure {
                    None => RunOutcome::Success {
                        output: format!("{line}\n"),
                    },
                    Some(code) => RunOutcome::Failure {
                        exit_code: Some(code),
                        output: format!("{line}\n"),
                        reason: FailureReason::NonZeroExit(code),
                    },
                };
                RunnerExit::Completed(outcome)
            }
            .await;

            in_flight.fetch_sub(1, Ordering::SeqCst);
            exit
        })
    }
}
