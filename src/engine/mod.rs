// src/engine/mod.rs

//! Orchestration engine.
//!
//! This module ties together:
//! - the job producer (lazy job sequence)
//! - the concurrency limiter (admission gate)
//! - the process runner (spawn + stream)
//! - the aggregator (per-job outcomes folded into the final report)

pub mod orchestrator;
pub mod report;

pub use orchestrator::{RunOptions, run_all, run_all_with};
pub use report::{AggregateReport, Aggregator, FailedJob};
