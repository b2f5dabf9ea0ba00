// src/producer.rs

//! Job producer abstraction.
//!
//! The orchestrator pulls jobs lazily, one at a time, so producers backed by
//! directory listings or network pagination are not forced to materialise up
//! front. A producer error is fatal to the whole run (it is the caller's
//! setup that is broken, not one job), which is why `next_job` returns a
//! plain `anyhow::Result` that the orchestrator wraps in
//! [`BatchError::Producer`](crate::errors::BatchError).

use anyhow::Result;

use crate::job::Job;

/// A lazy, finite, fallible sequence of jobs.
pub trait JobProducer: Send {
    /// Return the next job, `None` once exhausted.
    ///
    /// An `Err` aborts the whole run as a setup error.
    fn next_job(&mut self) -> Result<Option<Job>>;
}

/// In-memory producer over a fixed list of jobs. Never fails.
#[derive(Debug)]
pub struct JobList {
    jobs: std::vec::IntoIter<Job>,
}

impl JobList {
    pub fn new(jobs: Vec<Job>) -> Self {
        Self {
            jobs: jobs.into_iter(),
        }
    }
}

impl JobProducer for JobList {
    fn next_job(&mut self) -> Result<Option<Job>> {
        Ok(self.jobs.next())
    }
}

impl FromIterator<Job> for JobList {
    fn from_iter<I: IntoIterator<Item = Job>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Adapter turning any fallible iterator into a producer.
///
/// Useful for wrapping e.g. `std::fs::read_dir`, where each entry can fail
/// mid-iteration.
pub struct IterProducer<I> {
    inner: I,
}

impl<I> IterProducer<I>
where
    I: Iterator<Item = Result<Job>> + Send,
{
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<I> JobProducer for IterProducer<I>
where
    I: Iterator<Item = Result<Job>> + Send,
{
    fn next_job(&mut self) -> Result<Option<Job>> {
        self.inner.next().transpose()
    }
}
