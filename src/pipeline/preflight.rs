// src/pipeline/preflight.rs

//! Built-in `preflight` step: are the repo docs and toolchain in place?

use std::io::Write;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::config::PreflightSection;
use crate::fs::FileSystem;
use crate::types::Verdict;

/// Command text recorded for the preflight step.
pub const PREFLIGHT_COMMAND: &str = "internal preflight";

/// Check every required path and command, write the verdict to `log`.
pub async fn run_preflight(
    cfg: &PreflightSection,
    fs: &dyn FileSystem,
    log: &mut (dyn Write + Send),
) -> Verdict {
    let missing_paths: Vec<String> = cfg
        .required_paths
        .iter()
        .filter(|path| !fs.exists(path))
        .map(|path| path.display().to_string())
        .collect();

    let mut missing_commands = Vec::new();
    for command in &cfg.required_commands {
        let Some((program, args)) = command.split_first() else {
            continue;
        };
        if !command_available(program, args).await {
            missing_commands.push(program.clone());
        }
    }

    let verdict = verdict_for(&missing_paths, &missing_commands);
    let _ = writeln!(log, "preflight: {}", verdict.reason);
    verdict
}

fn verdict_for(missing_paths: &[String], missing_commands: &[String]) -> Verdict {
    if missing_paths.is_empty() && missing_commands.is_empty() {
        return Verdict::ok("reason=ready");
    }

    let mut parts = Vec::new();
    if !missing_paths.is_empty() {
        parts.push(format!("missing_paths({})", missing_paths.join(",")));
    }
    if !missing_commands.is_empty() {
        parts.push(format!("missing_commands({})", missing_commands.join(",")));
    }
    Verdict::error(format!("reason={}", parts.join(";")))
}

async fn command_available(program: &str, args: &[String]) -> bool {
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) => status.success(),
        Err(err) => {
            debug!(program, error = %err, "preflight command unavailable");
            false
        }
    }
}
