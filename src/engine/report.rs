// src/engine/report.rs

//! Line protocol written to stdout.
//!
//! Each step yields `<STATUS>: <step> <reason> duration_ms=<N> log=<path>`;
//! the run ends with `OK: plan completed=true` or `ERROR: plan stopped=true`.

use std::io::Write;

use tracing::warn;

use crate::types::{StepResult, StepStatus};

/// Render the summary line for one step.
pub fn step_line(step_name: &str, result: &StepResult) -> String {
    let log = if result.log_path.as_os_str().is_empty() {
        "-".to_string()
    } else {
        result.log_path.display().to_string()
    };
    format!(
        "{}: {} {} duration_ms={} log={}",
        result.status,
        step_name,
        result.reason,
        result.duration_ms(),
        log
    )
}

/// Render the final plan line.
pub fn plan_line(stopped: bool) -> String {
    if stopped {
        format!("{}: plan stopped=true", StepStatus::Error)
    } else {
        format!("{}: plan completed=true", StepStatus::Ok)
    }
}

/// Sink for protocol lines.
pub struct Reporter {
    out: Box<dyn Write + Send>,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter").finish_non_exhaustive()
    }
}

impl Reporter {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self { out: Box::new(out) }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    pub fn step(&mut self, step_name: &str, result: &StepResult) {
        self.line(&step_line(step_name, result));
    }

    pub fn plan(&mut self, stopped: bool) {
        self.line(&plan_line(stopped));
    }

    /// `<STATUS>: <subject> <detail>`, used for help, cli, config and panic lines.
    pub fn status(&mut self, status: StepStatus, subject: &str, detail: &str) {
        self.line(&format!("{status}: {subject} {detail}"));
    }

    pub fn line(&mut self, text: &str) {
        let written = writeln!(self.out, "{text}").and_then(|_| self.out.flush());
        if let Err(err) = written {
            warn!(error = %err, "failed to write report line");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Verdict;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn step_line_has_reason_duration_and_log() {
        let result = StepResult::new(Verdict::ok("reason=command_ok"), "go run ./cmd/review-pack")
            .stamped(Duration::from_millis(1234), PathBuf::from(".local/out/run/r/bundle-make.log"));

        assert_eq!(
            step_line("bundle-make", &result),
            "OK: bundle-make reason=command_ok duration_ms=1234 log=.local/out/run/r/bundle-make.log"
        );
    }

    #[test]
    fn step_line_without_log_uses_dash() {
        let result = StepResult::new(Verdict::skip("reason=already stopped"), "");
        assert_eq!(
            step_line("full-test", &result),
            "SKIP: full-test reason=already stopped duration_ms=0 log=-"
        );
    }

    #[test]
    fn plan_lines() {
        assert_eq!(plan_line(false), "OK: plan completed=true");
        assert_eq!(plan_line(true), "ERROR: plan stopped=true");
    }
}
