// src/state/mod.rs

//! Durable run state.
//!
//! [`RunState`] is the single-owner context threaded through the plan driver.
//! Its history is append-only and its stop flag is a ratchet: only
//! [`RunState::begin_run`] (called once per process start) clears it.

pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{StepResult, StepStatus};

pub use store::StateStore;

/// One recorded step outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry {
    pub run_id: String,
    pub step: String,
    pub status: StepStatus,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
    pub log_path: String,
    pub command: String,
}

/// Persisted state of the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    #[serde(default)]
    stop: bool,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    last_step: String,
    #[serde(default)]
    last_status: Option<StepStatus>,
    #[serde(default)]
    run_id: String,
    #[serde(default)]
    steps: Vec<StateEntry>,
}

impl RunState {
    /// Start a new run: clear the stop flag and reason, keep the history.
    pub fn begin_run(&mut self, run_id: impl Into<String>) {
        self.stop = false;
        self.reason.clear();
        self.run_id = run_id.into();
    }

    /// Append the outcome of `step_name`. An ERROR sets the stop flag.
    pub fn record(&mut self, step_name: &str, result: &StepResult) {
        let now = Utc::now();

        self.steps.push(StateEntry {
            run_id: self.run_id.clone(),
            step: step_name.to_string(),
            status: result.status,
            reason: result.reason.clone(),
            timestamp: now,
            duration_ms: result.duration_ms(),
            log_path: result.log_path.display().to_string(),
            command: result.command.clone(),
        });

        self.updated_at = Some(now);
        self.last_step = step_name.to_string();
        self.last_status = Some(result.status);

        if result.status.is_error() {
            self.stop = true;
            self.reason = format!("step={step_name} {}", result.reason);
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stop
    }

    pub fn stop_reason(&self) -> &str {
        &self.reason
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn last_step(&self) -> &str {
        &self.last_step
    }

    pub fn last_status(&self) -> Option<StepStatus> {
        self.last_status
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Full history, oldest first.
    pub fn entries(&self) -> &[StateEntry] {
        &self.steps
    }

    /// Entries belonging to the current run.
    pub fn current_run_entries(&self) -> impl Iterator<Item = &StateEntry> {
        self.steps.iter().filter(|e| e.run_id == self.run_id)
    }
}

/// Time-derived run identifier, e.g. `run-1760870400-042`.
pub fn new_run_id(now: DateTime<Utc>) -> String {
    format!(
        "run-{}-{:03}",
        now.timestamp(),
        now.timestamp_subsec_millis().min(999)
    )
}
