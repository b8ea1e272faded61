// src/exec/step_runner.rs

//! Run one step: open its log, dispatch on its recipe, stamp the result.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::config::{ConfigFile, PreflightSection};
use crate::exec::arbiter::arbitrate;
use crate::exec::backend::StepExecutor;
use crate::exec::log_sink::LogSink;
use crate::exec::supervisor::ProcessSupervisor;
use crate::fs::FileSystem;
use crate::pipeline::preflight::{PREFLIGHT_COMMAND, run_preflight};
use crate::pipeline::{Arbitration, ExternalRecipe, Recipe, RecipeBook, Step};
use crate::types::{StepResult, Verdict};

/// Everything needed to run one step once.
#[derive(Debug, Clone)]
pub struct StepRequest {
    pub step: Step,
    pub timebox: Duration,
    /// Directory of the current run; the step log goes here.
    pub run_dir: PathBuf,
}

/// Production step executor.
#[derive(Debug)]
pub struct StepRunner {
    recipes: RecipeBook,
    preflight: PreflightSection,
    supervisor: ProcessSupervisor,
    fallback_log: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl StepRunner {
    pub fn new(
        recipes: RecipeBook,
        preflight: PreflightSection,
        supervisor: ProcessSupervisor,
        fallback_log: PathBuf,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            recipes,
            preflight,
            supervisor,
            fallback_log,
            fs,
        }
    }

    pub fn from_config(cfg: &ConfigFile, fs: Arc<dyn FileSystem>) -> Self {
        Self::new(
            RecipeBook::from_config(cfg),
            cfg.preflight.clone(),
            ProcessSupervisor::new(cfg.orchestrator.grace_period()),
            cfg.orchestrator.fallback_log.clone(),
            fs,
        )
    }

    /// Run `request.step`. Never fails: every problem becomes an ERROR result.
    pub async fn run(&self, request: &StepRequest) -> StepResult {
        let started = Instant::now();
        let step = request.step;
        let primary = request.run_dir.join(step.log_file_name());
        let recipe = self.recipes.get(step);

        let mut log = match LogSink::open_with_fallback(&primary, &self.fallback_log) {
            Ok(log) => log,
            Err(failure) => {
                error!(step = %step, reason = %failure.reason(), "no usable step log");
                return StepResult::new(Verdict::error(failure.reason()), command_text(recipe))
                    .stamped(started.elapsed(), failure.fallback_path);
            }
        };

        info!(step = %step, log = %log.path().display(), "running step");

        let result = match recipe {
            None => StepResult::new(Verdict::error("reason=unknown_step"), "internal"),
            Some(Recipe::Manual) => {
                log.line("manual step: nothing to run");
                StepResult::new(Verdict::skip("reason=manual_step"), "manual")
            }
            Some(Recipe::Preflight) => {
                let verdict = run_preflight(&self.preflight, self.fs.as_ref(), &mut log).await;
                StepResult::new(verdict, PREFLIGHT_COMMAND)
            }
            Some(Recipe::External(recipe)) => {
                self.run_external(recipe, &mut log, request.timebox).await
            }
        };

        result.stamped(started.elapsed(), log.path().to_path_buf())
    }

    async fn run_external(
        &self,
        recipe: &ExternalRecipe,
        log: &mut LogSink,
        timebox: Duration,
    ) -> StepResult {
        let invocation = &recipe.invocation;
        log.line(&format!(
            "command={} args={}",
            invocation.program,
            invocation.args.join(" ")
        ));
        if let Arbitration::StatusFile(path) = &recipe.arbitration {
            log.line(&format!(
                "status_first=true status_path={}",
                path.display()
            ));
        }

        let supervision = self.supervisor.supervise(invocation, log, timebox).await;
        let verdict = arbitrate(&recipe.arbitration, &supervision, self.fs.as_ref());

        StepResult::new(verdict, invocation.command_text())
    }
}

fn command_text(recipe: Option<&Recipe>) -> String {
    match recipe {
        Some(Recipe::External(recipe)) => recipe.invocation.command_text(),
        Some(Recipe::Preflight) => PREFLIGHT_COMMAND.to_string(),
        Some(Recipe::Manual) => "manual".to_string(),
        None => "internal".to_string(),
    }
}

impl StepExecutor for StepRunner {
    fn execute(
        &mut self,
        request: StepRequest,
    ) -> Pin<Box<dyn Future<Output = StepResult> + Send + '_>> {
        Box::pin(async move { self.run(&request).await })
    }
}
