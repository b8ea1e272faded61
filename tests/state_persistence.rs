// tests/state_persistence.rs

use std::error::Error;
use std::sync::Arc;

use ci_orch::fs::RealFileSystem;
use ci_orch::state::{RunState, StateStore};
use ci_orch::types::StepStatus;
use ci_orch_test_utils::builders::step_result;

type TestResult = Result<(), Box<dyn Error>>;

fn store(path: &std::path::Path) -> StateStore {
    StateStore::new(path, Arc::new(RealFileSystem))
}

#[test]
fn corrupt_prior_state_behaves_like_no_state() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ci/state.json");
    std::fs::create_dir_all(path.parent().unwrap())?;
    std::fs::write(&path, "\u{0}\u{1}not json at all")?;

    let mut from_corrupt = store(&path).load();
    let mut from_empty = RunState::default();
    for state in [&mut from_corrupt, &mut from_empty] {
        state.begin_run("run-5-000");
    }

    assert_eq!(from_corrupt, from_empty);
    assert!(from_corrupt.entries().is_empty());
    Ok(())
}

#[test]
fn save_creates_parent_directories_and_writes_pretty_json() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested/ci/state.json");
    let store = store(&path);

    let mut state = RunState::default();
    state.begin_run("run-5-000");
    state.record("preflight", &step_result(StepStatus::Ok, "reason=ready"));
    store.save(&state)?;

    let text = std::fs::read_to_string(&path)?;
    assert!(text.contains("\n  \"stop\": false"));
    let json: serde_json::Value = serde_json::from_str(&text)?;
    assert_eq!(json["run_id"], "run-5-000");
    assert_eq!(json["last_status"], "OK");
    assert_eq!(json["steps"][0]["step"], "preflight");
    assert_eq!(json["steps"][0]["duration_ms"], 1);
    Ok(())
}

#[test]
fn history_accumulates_across_runs_but_stop_resets() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state.json");
    let store = store(&path);

    let mut first = store.load();
    first.begin_run("run-1-000");
    first.record("full-build", &step_result(StepStatus::Error, "reason=command_failed(exit_code=1)"));
    store.save(&first)?;

    let mut second = store.load();
    assert!(second.is_stopped());
    second.begin_run("run-2-000");
    assert!(!second.is_stopped());
    second.record("full-build", &step_result(StepStatus::Ok, "reason=command_ok"));
    store.save(&second)?;

    let reloaded = store.load();
    let runs: Vec<&str> = reloaded.entries().iter().map(|e| e.run_id.as_str()).collect();
    assert_eq!(runs, vec!["run-1-000", "run-2-000"]);
    assert!(!reloaded.is_stopped());
    assert_eq!(reloaded.stop_reason(), "");
    Ok(())
}
