// tests/plan_properties.rs

use std::time::Duration;

use proptest::prelude::*;

use ci_orch::engine::{ALREADY_STOPPED_REASON, PlanDriver, Reporter};
use ci_orch::pipeline::PLAN;
use ci_orch::state::RunState;
use ci_orch::types::StepStatus;
use ci_orch_test_utils::SharedBuffer;
use ci_orch_test_utils::builders::step_result;
use ci_orch_test_utils::fake_executor::ScriptedExecutor;

fn status_strategy() -> impl Strategy<Value = StepStatus> {
    prop_oneof![
        Just(StepStatus::Ok),
        Just(StepStatus::Skip),
        Just(StepStatus::Error),
    ]
}

fn run_plan(scripted: &[StepStatus]) -> (RunState, Vec<ci_orch::pipeline::Step>) {
    let executor = PLAN
        .iter()
        .zip(scripted)
        .fold(ScriptedExecutor::new(), |ex, (&step, &status)| {
            ex.with(step, step_result(status, "reason=scripted"))
        });
    let mut driver = PlanDriver::new(executor, Reporter::new(SharedBuffer::new()), "run");
    let mut state = RunState::default();
    state.begin_run("run-1-000");

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    rt.block_on(driver.run_plan(&mut state, Duration::from_secs(60)));

    let executed = driver.executor().executed_steps();
    (state, executed)
}

proptest! {
    #[test]
    fn everything_after_the_first_error_is_skipped(
        scripted in proptest::collection::vec(status_strategy(), PLAN.len())
    ) {
        let (state, executed) = run_plan(&scripted);
        let entries = state.entries();

        prop_assert_eq!(entries.len(), PLAN.len());

        let first_error = scripted.iter().position(|s| s.is_error());
        match first_error {
            Some(first_error) => {
                prop_assert!(state.is_stopped());
                prop_assert_eq!(executed.len(), first_error + 1);
                prop_assert_eq!(&entries[first_error].status, &StepStatus::Error);
                let expected_prefix = format!("step={} ", PLAN[first_error].name());
                prop_assert!(state.stop_reason().starts_with(&expected_prefix));
                for entry in &entries[first_error + 1..] {
                    prop_assert_eq!(&entry.status, &StepStatus::Skip);
                    prop_assert_eq!(entry.reason.as_str(), ALREADY_STOPPED_REASON);
                }
            }
            None => {
                prop_assert!(!state.is_stopped());
                prop_assert_eq!(executed, PLAN.to_vec());
                let recorded: Vec<StepStatus> = entries.iter().map(|e| e.status).collect();
                prop_assert_eq!(recorded, scripted);
            }
        }
    }
}
