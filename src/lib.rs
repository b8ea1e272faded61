// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod state;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::cli::{Command, Invocation};
use crate::config::{ConfigFile, default_config_path, load_or_default};
use crate::engine::{PlanDriver, Reporter};
use crate::errors::{OrchError, Result};
use crate::exec::StepRunner;
use crate::fs::{FileSystem, RealFileSystem};
use crate::state::{RunState, StateStore, new_run_id};
use crate::types::{StepResult, StepStatus, Verdict};

/// Subject of the entry recorded for an unexpected fault.
pub const FAULT_SUBJECT: &str = "ci_orch";

/// Where a run reads its inputs and writes its outputs.
#[derive(Debug)]
pub struct RunContext {
    pub fs: Arc<dyn FileSystem>,
    pub reporter: Reporter,
    /// Config consulted when `--config` is absent or unusable.
    pub default_config_path: PathBuf,
}

impl RunContext {
    pub fn production() -> Self {
        Self {
            fs: Arc::new(RealFileSystem),
            reporter: Reporter::stdout(),
            default_config_path: default_config_path(),
        }
    }
}

/// What a finished invocation reports back to `main`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: String,
    pub stopped: bool,
}

impl RunSummary {
    pub fn exit_code(&self) -> u8 {
        u8::from(self.stopped)
    }
}

/// High-level entry point used by `main.rs`.
pub async fn run(parsed: Result<Invocation>) -> RunSummary {
    run_with(parsed, RunContext::production()).await
}

/// Run one invocation against `ctx`.
///
/// - config loading (a broken config is recorded as the `config` step)
/// - run id, run directory, state load + reset
/// - cli errors recorded as the `cli` step
/// - help, single step or full plan
/// - state save and the final plan line
pub async fn run_with(parsed: Result<Invocation>, ctx: RunContext) -> RunSummary {
    let RunContext {
        fs,
        mut reporter,
        default_config_path,
    } = ctx;

    let (cfg, config_error) = resolve_config(parsed.as_ref().ok(), &default_config_path);

    let run_id = new_run_id(Utc::now());
    let run_dir = cfg.orchestrator.run_root.join(&run_id);
    if let Err(err) = fs.create_dir_all(&run_dir) {
        warn!(run_dir = %run_dir.display(), error = %err, "failed to create run directory");
    }

    let store = StateStore::new(cfg.orchestrator.state_file.clone(), Arc::clone(&fs));
    let mut state = store.load();
    state.begin_run(&run_id);
    info!(run_id = %run_id, state = %store.path().display(), "run started");

    match (parsed, config_error) {
        (Err(err), _) => record_fault(&mut reporter, &mut state, "cli", &err),
        (Ok(_), Some(err)) => record_fault(&mut reporter, &mut state, "config", &err),
        (Ok(invocation), None) => {
            reporter = execute(invocation, &cfg, fs, &run_dir, reporter, &mut state).await;
        }
    }

    if let Err(err) = store.save(&state) {
        error!(path = %store.path().display(), error = %err, "failed to save run state");
    }

    reporter.plan(state.is_stopped());
    info!(run_id = %run_id, stopped = state.is_stopped(), "run finished");

    RunSummary {
        run_id,
        stopped: state.is_stopped(),
    }
}

async fn execute(
    invocation: Invocation,
    cfg: &ConfigFile,
    fs: Arc<dyn FileSystem>,
    run_dir: &Path,
    mut reporter: Reporter,
    state: &mut RunState,
) -> Reporter {
    let timebox = cfg.orchestrator.timebox(invocation.timebox_min);

    let step = match invocation.command {
        Command::Help(text) => {
            reporter.line(text.trim_end());
            reporter.status(StepStatus::Ok, "help", "usage_shown=true");
            return reporter;
        }
        Command::RunStep(step) => Some(step),
        Command::RunPlan => None,
    };

    let runner = StepRunner::from_config(cfg, fs);
    let mut driver = PlanDriver::new(runner, reporter, run_dir);
    match step {
        Some(step) => {
            driver.run_step(state, step, timebox).await;
        }
        None => {
            driver.run_plan(state, timebox).await;
        }
    }
    driver.into_reporter()
}

/// Pick the effective config.
///
/// An unusable explicit config falls back to the default-path config so the
/// `config` failure lands in the project's usual state file.
fn resolve_config(
    invocation: Option<&Invocation>,
    default_path: &Path,
) -> (ConfigFile, Option<OrchError>) {
    let explicit = invocation.and_then(|inv| inv.config.as_deref());

    match explicit {
        Some(path) => match load_or_default(path, true) {
            Ok(cfg) => (cfg, None),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "config unusable");
                (default_path_config(default_path), Some(err))
            }
        },
        None => match load_or_default(default_path, false) {
            Ok(cfg) => (cfg, None),
            Err(err) => {
                warn!(path = %default_path.display(), error = %err, "config unusable");
                (ConfigFile::default(), invocation.map(|_| err))
            }
        },
    }
}

fn default_path_config(default_path: &Path) -> ConfigFile {
    load_or_default(default_path, false).unwrap_or_else(|err| {
        warn!(path = %default_path.display(), error = %err, "default config unusable; using built-in defaults");
        ConfigFile::default()
    })
}

/// Print and record a non-step failure (`cli`, `config`, `ci_orch`).
fn record_fault(reporter: &mut Reporter, state: &mut RunState, subject: &str, err: &OrchError) {
    let reason = format!("reason={err}");
    reporter.status(StepStatus::Error, subject, &reason);
    state.record(subject, &StepResult::new(Verdict::error(reason), ""));
}

/// Best-effort handling of a fault that escaped the run.
///
/// Prints `ERROR: ci_orch panic=<message>` and tries to append a matching
/// entry to the persisted state.
pub fn record_panic(ctx: RunContext, message: &str) {
    let RunContext {
        fs,
        mut reporter,
        default_config_path,
    } = ctx;

    reporter.status(StepStatus::Error, FAULT_SUBJECT, &format!("panic={message}"));

    let cfg = default_path_config(&default_config_path);
    let store = StateStore::new(cfg.orchestrator.state_file.clone(), fs);
    let mut state = store.load();
    state.begin_run(new_run_id(Utc::now()));
    state.record(
        FAULT_SUBJECT,
        &StepResult::new(Verdict::error(format!("reason=panic({message})")), ""),
    );
    if let Err(err) = store.save(&state) {
        error!(error = %err, "failed to record panic in run state");
    }
}
