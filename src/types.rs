use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Final verdict of one step.
///
/// The textual form (`OK`, `SKIP`, `ERROR`) is what appears on the line
/// protocol, in the persisted state and inside status artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "SKIP")]
    Skip,
    #[serde(rename = "ERROR")]
    Error,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Ok => "OK",
            StepStatus::Skip => "SKIP",
            StepStatus::Error => "ERROR",
        }
    }

    pub fn is_error(self) -> bool {
        matches!(self, StepStatus::Error)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "OK" => Ok(StepStatus::Ok),
            "SKIP" => Ok(StepStatus::Skip),
            "ERROR" => Ok(StepStatus::Error),
            other => Err(format!(
                "invalid step status: {other} (expected \"OK\", \"SKIP\" or \"ERROR\")"
            )),
        }
    }
}

/// A status together with the `reason=...` text explaining it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: StepStatus,
    pub reason: String,
}

impl Verdict {
    pub fn new(status: StepStatus, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }

    pub fn ok(reason: impl Into<String>) -> Self {
        Self::new(StepStatus::Ok, reason)
    }

    pub fn skip(reason: impl Into<String>) -> Self {
        Self::new(StepStatus::Skip, reason)
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self::new(StepStatus::Error, reason)
    }
}

/// Outcome of one step invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub status: StepStatus,
    pub reason: String,
    pub duration: Duration,
    /// Log actually written (may be the fallback log). Empty when no log was opened.
    pub log_path: PathBuf,
    /// Literal command text that was run.
    pub command: String,
}

impl StepResult {
    /// A result with no timing or log information yet.
    pub fn new(verdict: Verdict, command: impl Into<String>) -> Self {
        Self {
            status: verdict.status,
            reason: verdict.reason,
            duration: Duration::ZERO,
            log_path: PathBuf::new(),
            command: command.into(),
        }
    }

    /// Stamp elapsed time and the effective log path.
    pub fn stamped(self, duration: Duration, log_path: PathBuf) -> Self {
        Self {
            duration,
            log_path,
            ..self
        }
    }

    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }
}
