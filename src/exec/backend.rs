// src/exec/backend.rs

//! Pluggable step executor abstraction.
//!
//! The plan driver talks to a `StepExecutor` instead of the step runner
//! directly, so tests can script step outcomes without spawning processes.
//! [`StepRunner`](super::step_runner::StepRunner) is the production
//! implementation.

use std::future::Future;
use std::pin::Pin;

use crate::exec::step_runner::StepRequest;
use crate::types::StepResult;

/// Trait abstracting how a single step is executed.
pub trait StepExecutor: Send {
    /// Run one step to completion and report its result.
    ///
    /// Implementations must not fail: problems are reported as ERROR results.
    fn execute(
        &mut self,
        request: StepRequest,
    ) -> Pin<Box<dyn Future<Output = StepResult> + Send + '_>>;
}
