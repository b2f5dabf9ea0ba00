// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the external commands the
//! executor builds, using `tokio::process::Command`, streaming output to the
//! caller's sink and resolving to a terminal
//! [`RunOutcome`](crate::job::RunOutcome).
//!
//! - [`runner`] owns the [`CommandRunner`] seam and the production
//!   [`ProcessRunner`] implementation. Tests swap in fakes that never touch
//!   the OS.

pub mod runner;

pub use runner::{CommandRunner, ProcessRunner, RunnerExit};
