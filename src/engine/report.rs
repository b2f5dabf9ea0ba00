// src/engine/report.rs

//! Result aggregation: per-job outcomes folded into one final report.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::job::{FailureReason, JobId, RunOutcome};

/// One failed job, with enough context to diagnose it without re-running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedJob {
    pub id: JobId,
    pub reason: FailureReason,
    /// Captured process output up to the failure, if any.
    pub output: String,
}

/// Final outcome of a whole orchestration run.
///
/// `failures` is in completion order, which under concurrency is not
/// submission order. `succeeded + failed` equals the number of jobs that
/// reached a terminal state; under cancellation that can be less than
/// `total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Jobs produced by the producer during this run.
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<FailedJob>,
    /// True if the run was cancelled before every job completed.
    pub cancelled: bool,
}

impl AggregateReport {
    pub fn all_succeeded(&self) -> bool {
        !self.cancelled && self.failed == 0 && self.succeeded == self.total
    }

    /// Outcomes recorded so far (equals `total` for a completed run).
    pub fn recorded(&self) -> usize {
        self.succeeded + self.failed
    }
}

#[derive(Debug, Default)]
struct ReportState {
    total: usize,
    succeeded: usize,
    failed: usize,
    failures: Vec<FailedJob>,
}

/// Accumulates outcomes from concurrently completing jobs.
///
/// Clones share state; `record` is safe to call from any number of job
/// tasks. Each job records exactly once: the orchestrator hands each
/// outcome over a single time, right before releasing the job's slot.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    state: Arc<Mutex<ReportState>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note that one more job was produced (counted in `total`).
    pub fn job_produced(&self) {
        self.state.lock().unwrap().total += 1;
    }

    /// Record the terminal outcome of one job.
    pub fn record(&self, job_id: &JobId, outcome: &RunOutcome) {
        let mut state = self.state.lock().unwrap();
        match outcome {
            RunOutcome::Success { .. } => {
                state.succeeded += 1;
                debug!(job = %job_id, "recorded success");
            }
            RunOutcome::Failure {
                output, reason, ..
            } => {
                state.failed += 1;
                debug!(job = %job_id, reason = %reason, "recorded failure");
                state.failures.push(FailedJob {
                    id: job_id.clone(),
                    reason: reason.clone(),
                    output: output.clone(),
                });
            }
        }
    }

    /// True once every produced job has a recorded outcome.
    pub fn is_complete(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.succeeded + state.failed == state.total
    }

    /// Snapshot the final report. Called once, after the orchestrator has
    /// joined every job task (or given up on them via cancellation).
    pub fn finalize(self, cancelled: bool) -> AggregateReport {
        let state = self.state.lock().unwrap();
        AggregateReport {
            total: state.total,
            succeeded: state.succeeded,
            failed: state.failed,
            failures: state.failures.clone(),
            cancelled,
        }
    }
}
