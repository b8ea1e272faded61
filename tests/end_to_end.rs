// tests/end_to_end.rs
#![cfg(unix)]

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use ci_orch::cli;
use ci_orch::fs::RealFileSystem;
use ci_orch::{RunContext, RunSummary, run_with};
use ci_orch_test_utils::builders::ConfigTomlBuilder;
use ci_orch_test_utils::{SharedBuffer, init_tracing, with_timeout_secs};
use serde_json::Value;

type TestResult = Result<(), Box<dyn Error>>;

fn context(default_config: &Path, out: &SharedBuffer) -> RunContext {
    RunContext {
        fs: Arc::new(RealFileSystem),
        reporter: ci_orch::engine::Reporter::new(out.clone()),
        default_config_path: default_config.to_path_buf(),
    }
}

async fn invoke(args: &[&str], default_config: &Path) -> (RunSummary, Vec<String>) {
    init_tracing();
    let out = SharedBuffer::new();
    let parsed = cli::parse_from(std::iter::once("ci-orch").chain(args.iter().copied()));
    let summary = with_timeout_secs(30, run_with(parsed, context(default_config, &out))).await;
    (summary, out.lines())
}

fn read_state(path: &Path) -> Result<Value, Box<dyn Error>> {
    Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
}

fn statuses(state: &Value) -> Vec<String> {
    state["steps"]
        .as_array()
        .map(|steps| {
            steps
                .iter()
                .map(|s| s["status"].as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn green_plan_completes_and_exits_zero() -> TestResult {
    let dir = tempfile::tempdir()?;
    let builder = ConfigTomlBuilder::new(dir.path()).all_external_steps_succeed();
    let config = builder.write();

    let (summary, lines) = invoke(&["run-plan"], &config).await;

    assert!(!summary.stopped);
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(lines.len(), 7);
    assert!(lines[0].starts_with("OK: preflight reason=ready duration_ms="));
    assert!(lines[5].starts_with("SKIP: pr-create reason=manual_step"));
    assert_eq!(lines[6], "OK: plan completed=true");

    let state = read_state(&builder.state_file())?;
    assert_eq!(state["stop"], false);
    assert_eq!(statuses(&state), ["OK", "OK", "OK", "OK", "OK", "SKIP"]);
    let log = state["steps"][1]["log_path"].as_str().unwrap_or_default();
    let expected_dir = builder.run_root().join(summary.run_id.as_str());
    assert_eq!(Path::new(log), expected_dir.join("verify-lite.log"));
    Ok(())
}

#[tokio::test]
async fn status_file_error_stops_plan_and_is_persisted() -> TestResult {
    let dir = tempfile::tempdir()?;
    let status = dir.path().join("verify-lite.status");
    let script = format!("echo status=ERROR > {}; exit 0", status.display());
    let builder = ConfigTomlBuilder::new(dir.path())
        .all_external_steps_succeed()
        .step("verify-lite", "sh", &["-c", &script], Some(&status));
    let config = builder.write();

    let (summary, lines) = invoke(&[], &config).await;

    assert!(summary.stopped);
    assert_eq!(summary.exit_code(), 1);
    assert!(lines[1].starts_with("ERROR: verify-lite reason=status_file("));
    assert!(lines[2].starts_with("SKIP: full-build reason=already stopped"));
    assert_eq!(lines.last().map(String::as_str), Some("ERROR: plan stopped=true"));

    let state = read_state(&builder.state_file())?;
    assert_eq!(state["stop"], true);
    assert!(state["reason"].as_str().unwrap_or_default().contains("verify-lite"));
    assert_eq!(
        statuses(&state),
        ["OK", "ERROR", "SKIP", "SKIP", "SKIP", "SKIP"]
    );
    Ok(())
}

#[tokio::test]
async fn next_invocation_starts_unstopped_and_keeps_history() -> TestResult {
    let dir = tempfile::tempdir()?;
    let failing = ConfigTomlBuilder::new(dir.path())
        .all_external_steps_succeed()
        .step("full-build", "false", &[], None);
    let config = failing.write();
    let (first, _) = invoke(&["full-build"], &config).await;
    assert!(first.stopped);

    let passing = ConfigTomlBuilder::new(dir.path()).all_external_steps_succeed();
    passing.write();
    let (second, lines) = invoke(&["full-build", "--timebox-min", "2"], &config).await;

    assert!(!second.stopped);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("OK: full-build reason=command_ok"));
    assert_eq!(lines[1], "OK: plan completed=true");
    let state = read_state(&passing.state_file())?;
    assert_eq!(statuses(&state), ["ERROR", "OK"]);
    assert_eq!(state["reason"], "");
    Ok(())
}

#[tokio::test]
async fn cli_error_is_recorded_as_cli_step() -> TestResult {
    let dir = tempfile::tempdir()?;
    let builder = ConfigTomlBuilder::new(dir.path());
    let config = builder.write();

    let (summary, lines) = invoke(&["deploy"], &config).await;

    assert!(summary.stopped);
    assert!(lines[0].starts_with("ERROR: cli reason=unknown command: deploy"));
    assert_eq!(lines[1], "ERROR: plan stopped=true");

    let state = read_state(&builder.state_file())?;
    assert_eq!(state["last_step"], "cli");
    assert_eq!(state["last_status"], "ERROR");
    assert!(state["reason"].as_str().unwrap_or_default().starts_with("step=cli "));
    Ok(())
}

#[tokio::test]
async fn broken_explicit_config_is_recorded_as_config_step() -> TestResult {
    let dir = tempfile::tempdir()?;
    let builder = ConfigTomlBuilder::new(dir.path());
    let config = builder.write();
    let broken = dir.path().join("broken.toml");
    std::fs::write(&broken, "[orchestrator]\ndefault_timebox_min = 0\n")?;

    let (summary, lines) = invoke(
        &["run-plan", "--config", broken.to_str().unwrap_or_default()],
        &config,
    )
    .await;

    assert!(summary.stopped);
    assert!(lines[0].starts_with("ERROR: config reason="));
    assert!(lines[0].contains("default_timebox_min"));
    let state = read_state(&builder.state_file())?;
    assert_eq!(state["steps"].as_array().map(Vec::len), Some(1));
    assert_eq!(state["steps"][0]["step"], "config");
    Ok(())
}

#[tokio::test]
async fn help_prints_usage_and_completes() -> TestResult {
    let dir = tempfile::tempdir()?;
    let builder = ConfigTomlBuilder::new(dir.path());
    let config = builder.write();

    let (summary, lines) = invoke(&["--help"], &config).await;

    assert!(!summary.stopped);
    assert!(lines.iter().any(|l| l.contains("Usage")));
    assert_eq!(
        lines[lines.len() - 2..],
        ["OK: help usage_shown=true".to_string(), "OK: plan completed=true".to_string()]
    );
    let state = read_state(&builder.state_file())?;
    assert_eq!(statuses(&state), Vec::<String>::new());
    Ok(())
}
