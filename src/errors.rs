// src/errors.rs

//! Crate-wide error types.
//!
//! Only run-level failures live here: things that abort the whole
//! orchestration. Per-job failures never become a `BatchError`; they are
//! recorded in the [`AggregateReport`](crate::engine::AggregateReport) and
//! the run keeps going.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("invalid max_concurrency {0}: must be at least 1")]
    InvalidConcurrency(usize),

    #[error("job producer failed: {0}")]
    Producer(#[source] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BatchError>;
