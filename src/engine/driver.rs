// src/engine/driver.rs

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::report::Reporter;
use crate::exec::{StepExecutor, StepRequest};
use crate::pipeline::{PLAN, Step};
use crate::state::RunState;
use crate::types::{StepResult, Verdict};

/// Reason recorded for steps skipped after the stop flag was set.
pub const ALREADY_STOPPED_REASON: &str = "reason=already stopped";

/// Results of one pass over a sequence of steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOutcome {
    pub results: Vec<(Step, StepResult)>,
    pub stopped: bool,
}

/// Runs steps one after another through a `StepExecutor`, recording each
/// result into the run state before the next step starts.
pub struct PlanDriver<E: StepExecutor> {
    executor: E,
    reporter: Reporter,
    run_dir: PathBuf,
}

impl<E: StepExecutor> fmt::Debug for PlanDriver<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanDriver")
            .field("run_dir", &self.run_dir)
            .finish_non_exhaustive()
    }
}

impl<E: StepExecutor> PlanDriver<E> {
    pub fn new(executor: E, reporter: Reporter, run_dir: impl Into<PathBuf>) -> Self {
        Self {
            executor,
            reporter,
            run_dir: run_dir.into(),
        }
    }

    pub fn reporter_mut(&mut self) -> &mut Reporter {
        &mut self.reporter
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn into_reporter(self) -> Reporter {
        self.reporter
    }

    /// Execute exactly one step and record it. An ERROR sets the stop flag.
    pub async fn run_step(
        &mut self,
        state: &mut RunState,
        step: Step,
        timebox: Duration,
    ) -> StepResult {
        let request = StepRequest {
            step,
            timebox,
            run_dir: self.run_dir.clone(),
        };

        debug!(step = %step, timebox_ms = timebox.as_millis() as u64, "dispatching step");
        let result = self.executor.execute(request).await;

        self.reporter.step(step.name(), &result);
        state.record(step.name(), &result);

        if result.status.is_error() {
            warn!(step = %step, reason = %result.reason, "step failed; stopping plan");
        } else {
            info!(step = %step, status = %result.status, "step finished");
        }

        result
    }

    /// Walk the fixed plan.
    pub async fn run_plan(&mut self, state: &mut RunState, timebox: Duration) -> PlanOutcome {
        self.run_steps(state, &PLAN, timebox).await
    }

    /// Walk `steps` in order. Once the stop flag is set every remaining step
    /// is recorded as SKIP without running.
    pub async fn run_steps(
        &mut self,
        state: &mut RunState,
        steps: &[Step],
        timebox: Duration,
    ) -> PlanOutcome {
        let mut results = Vec::with_capacity(steps.len());

        for &step in steps {
            let result = if state.is_stopped() {
                debug!(step = %step, "stop flag set; skipping");
                let skipped = StepResult::new(Verdict::skip(ALREADY_STOPPED_REASON), "");
                self.reporter.step(step.name(), &skipped);
                state.record(step.name(), &skipped);
                skipped
            } else {
                self.run_step(state, step, timebox).await
            };
            results.push((step, result));
        }

        PlanOutcome {
            results,
            stopped: state.is_stopped(),
        }
    }
}
