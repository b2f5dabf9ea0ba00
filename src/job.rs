// src/job.rs

//! Core data model: jobs, command specs, and per-job outcomes.
//!
//! The orchestrator treats a [`Job`] as an opaque token: it is produced by a
//! [`JobProducer`](crate::producer::JobProducer), round-tripped to the
//! [`JobExecutor`](crate::executor::JobExecutor) to build a [`CommandSpec`],
//! and its id shows up again in the final report. The core never inspects
//! the payload.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Public type alias for job identifiers throughout the crate.
pub type JobId = String;

/// One unit of work. Opaque to the orchestrator.
///
/// `payload` is free-form data for the executor (a path, an URL, whatever the
/// caller's executor needs to build the command). The core only reads `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub payload: Option<String>,
}

impl Job {
    pub fn new(id: impl Into<JobId>) -> Self {
        Self {
            id: id.into(),
            payload: None,
        }
    }

    pub fn with_payload(id: impl Into<JobId>, payload: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payload: Some(payload.into()),
        }
    }
}

/// An external command to run: executable plus ordered arguments.
///
/// Immutable once built; the runner never rewrites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arg_list(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Why a job failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// The executor could not translate the job into a runnable command.
    Translation(String),
    /// The process could not be started (not found, permissions, ...).
    Launch(String),
    /// The process ran but exited with a non-zero status.
    NonZeroExit(i32),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Translation(msg) => write!(f, "translation failed: {msg}"),
            FailureReason::Launch(msg) => write!(f, "launch failed: {msg}"),
            FailureReason::NonZeroExit(code) => write!(f, "process exited with code {code}"),
        }
    }
}

/// Terminal result of one job. Produced exactly once per job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Success {
        /// Everything the process wrote to stdout/stderr, in arrival order.
        output: String,
    },
    Failure {
        /// Exit code if the process got far enough to have one.
        exit_code: Option<i32>,
        /// Captured output up to the point of failure.
        output: String,
        reason: FailureReason,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success { .. })
    }

    /// Captured output regardless of success/failure.
    pub fn output(&self) -> &str {
        match self {
            RunOutcome::Success { output } => output,
            RunOutcome::Failure { output, .. } => output,
        }
    }
}
