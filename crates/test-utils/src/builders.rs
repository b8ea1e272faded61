#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ci_orch::types::{StepResult, StepStatus, Verdict};

/// Shorthand for a finished step result.
pub fn step_result(status: StepStatus, reason: &str) -> StepResult {
    StepResult::new(Verdict::new(status, reason), "scripted")
        .stamped(Duration::from_millis(1), PathBuf::from("scripted.log"))
}

/// Builds a `CiOrch.toml` whose state, run root and fallback log all live
/// under one scratch directory.
///
/// Preflight checks nothing unless paths/commands are added.
pub struct ConfigTomlBuilder {
    root: PathBuf,
    timebox_min: u64,
    grace_secs: u64,
    required_paths: Vec<String>,
    required_commands: Vec<Vec<String>>,
    steps: Vec<(String, String, Vec<String>, Option<PathBuf>)>,
}

impl ConfigTomlBuilder {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            timebox_min: 1,
            grace_secs: 1,
            required_paths: vec![],
            required_commands: vec![],
            steps: vec![],
        }
    }

    pub fn timebox_min(mut self, minutes: u64) -> Self {
        self.timebox_min = minutes;
        self
    }

    pub fn grace_secs(mut self, secs: u64) -> Self {
        self.grace_secs = secs;
        self
    }

    pub fn require_path(mut self, path: &str) -> Self {
        self.required_paths.push(path.to_string());
        self
    }

    pub fn require_command(mut self, argv: &[&str]) -> Self {
        self.required_commands
            .push(argv.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Override an external step's recipe. A later override of the same
    /// step replaces the earlier one.
    pub fn step(mut self, name: &str, program: &str, args: &[&str], status_file: Option<&Path>) -> Self {
        self.steps.retain(|(existing, ..)| existing != name);
        self.steps.push((
            name.to_string(),
            program.to_string(),
            args.iter().map(|s| s.to_string()).collect(),
            status_file.map(Path::to_path_buf),
        ));
        self
    }

    /// Every external step of the plan succeeds: exit-code steps run `true`,
    /// status-file steps write `status=OK` under the scratch root.
    pub fn all_external_steps_succeed(self) -> Self {
        let root = self.root.clone();
        let builder = self
            .step("full-build", "true", &[], None)
            .step("bundle-make", "true", &[], None);

        ["verify-lite", "full-test"]
            .into_iter()
            .fold(builder, |b, name| {
                let status = root.join(format!("{name}.status"));
                let script = format!("echo status=OK > {}", status.display());
                b.step(name, "sh", &["-c", &script], Some(&status))
            })
    }

    pub fn state_file(&self) -> PathBuf {
        self.root.join("ci/state.json")
    }

    pub fn run_root(&self) -> PathBuf {
        self.root.join("out/run")
    }

    pub fn fallback_log(&self) -> PathBuf {
        self.root.join("out/run/fallback.log")
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "[orchestrator]");
        let _ = writeln!(out, "state_file = {}", quote(&self.state_file().display().to_string()));
        let _ = writeln!(out, "run_root = {}", quote(&self.run_root().display().to_string()));
        let _ = writeln!(out, "fallback_log = {}", quote(&self.fallback_log().display().to_string()));
        let _ = writeln!(out, "default_timebox_min = {}", self.timebox_min);
        let _ = writeln!(out, "grace_period_secs = {}", self.grace_secs);

        let _ = writeln!(out, "\n[preflight]");
        let _ = writeln!(out, "required_paths = {}", list(&self.required_paths));
        let commands: Vec<String> = self.required_commands.iter().map(|c| list(c)).collect();
        let _ = writeln!(out, "required_commands = [{}]", commands.join(", "));

        for (name, program, args, status_file) in &self.steps {
            let _ = writeln!(out, "\n[step.{name}]");
            let _ = writeln!(out, "program = {}", quote(program));
            let _ = writeln!(out, "args = {}", list(args));
            if let Some(path) = status_file {
                let _ = writeln!(out, "status_file = {}", quote(&path.display().to_string()));
            }
        }
        out
    }

    /// Write the config to `<root>/CiOrch.toml` and return its path.
    pub fn write(&self) -> PathBuf {
        let path = self.root.join("CiOrch.toml");
        std::fs::write(&path, self.render()).expect("failed to write test config");
        path
    }
}

/// TOML literal string; test paths never contain single quotes.
fn quote(s: &str) -> String {
    format!("'{s}'")
}

fn list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| quote(s)).collect();
    format!("[{}]", quoted.join(", "))
}
