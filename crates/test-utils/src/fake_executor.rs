use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use ci_orch::exec::{StepExecutor, StepRequest};
use ci_orch::pipeline::Step;
use ci_orch::types::{StepResult, Verdict};

/// A fake executor that:
/// - records which steps were "run", in order
/// - returns the scripted result for each step, or OK `reason=command_ok`
///   for steps without a script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedExecutor {
    script: HashMap<Step, StepResult>,
    executed: Arc<Mutex<Vec<StepRequest>>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the result returned for `step`.
    pub fn with(mut self, step: Step, result: StepResult) -> Self {
        self.script.insert(step, result);
        self
    }

    /// Handle onto the executed-request log; stays valid after the executor
    /// moves into a driver.
    pub fn executed(&self) -> Arc<Mutex<Vec<StepRequest>>> {
        Arc::clone(&self.executed)
    }

    pub fn executed_steps(&self) -> Vec<Step> {
        self.executed.lock().unwrap().iter().map(|r| r.step).collect()
    }
}

impl StepExecutor for ScriptedExecutor {
    fn execute(
        &mut self,
        request: StepRequest,
    ) -> Pin<Box<dyn Future<Output = StepResult> + Send + '_>> {
        let result = self.script.get(&request.step).cloned().unwrap_or_else(|| {
            StepResult::new(Verdict::ok("reason=command_ok"), "true").stamped(
                Default::default(),
                request.run_dir.join(request.step.log_file_name()),
            )
        });
        self.executed.lock().unwrap().push(request);

        Box::pin(async move { result })
    }
}
