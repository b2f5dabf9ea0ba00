// src/executor.rs

//! Job executor abstraction: how a job becomes a runnable command.
//!
//! The executor is the only component that understands what a job *means*
//! (which tool to invoke, with which flags). The orchestrator just calls
//! `build_command` and runs whatever comes back. A translation failure is a
//! per-job failure, recorded in the report; it never aborts the run.

use std::fmt;

use crate::job::{CommandSpec, Job};

/// Error building a command for one job.
#[derive(Debug, Clone)]
pub struct TranslationError(pub String);

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TranslationError {}

/// Maps a job to the external command that performs it.
///
/// Implementations should be pure: same job in, same command out.
pub trait JobExecutor: Send + Sync {
    fn build_command(&self, job: &Job) -> Result<CommandSpec, TranslationError>;
}

/// Blanket impl so plain closures work as executors:
///
/// ```ignore
/// let executor = |job: &Job| Ok(CommandSpec::new("echo").arg(&job.id));
/// ```
impl<F> JobExecutor for F
where
    F: Fn(&Job) -> Result<CommandSpec, TranslationError> + Send + Sync,
{
    fn build_command(&self, job: &Job) -> Result<CommandSpec, TranslationError> {
        self(job)
    }
}
