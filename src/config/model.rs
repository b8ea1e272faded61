// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from `CiOrch.toml`.
///
/// ```toml
/// [orchestrator]
/// state_file = ".local/ci/state.json"
/// default_timebox_min = 20
///
/// [preflight]
/// required_paths = ["docs/ci/SYSTEM.md"]
/// required_commands = [["go", "version"]]
///
/// [step.verify-lite]
/// program = "go"
/// args = ["run", "./cmd/verify-lite"]
/// status_file = "out/verify-lite.status"
/// ```
///
/// Every section is optional. This is the unvalidated form; the rest of the
/// crate works with [`ConfigFile`], produced by `ConfigFile::try_from`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub orchestrator: OrchestratorSection,

    #[serde(default)]
    pub preflight: PreflightSection,

    /// Recipe overrides keyed by step name (`[step.<name>]`).
    #[serde(default)]
    pub step: BTreeMap<String, StepOverride>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub orchestrator: OrchestratorSection,
    pub preflight: PreflightSection,
    pub step: BTreeMap<String, StepOverride>,
}

impl ConfigFile {
    /// Build a config without running validation. Only `validate.rs` should
    /// call this.
    pub(crate) fn new_unchecked(
        orchestrator: OrchestratorSection,
        preflight: PreflightSection,
        step: BTreeMap<String, StepOverride>,
    ) -> Self {
        Self {
            orchestrator,
            preflight,
            step,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(
            OrchestratorSection::default(),
            PreflightSection::default(),
            BTreeMap::new(),
        )
    }
}

/// `[orchestrator]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrchestratorSection {
    /// Where the run state is persisted between invocations.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Parent of the per-run log directories.
    #[serde(default = "default_run_root")]
    pub run_root: PathBuf,

    /// Log path used when the per-step log can't be created.
    #[serde(default = "default_fallback_log")]
    pub fallback_log: PathBuf,

    /// Timebox applied when `--timebox-min` is not given.
    #[serde(default = "default_timebox_min")]
    pub default_timebox_min: u64,

    /// How long to wait after SIGINT before giving up on a timed-out child.
    #[serde(default = "default_grace_period_secs")]
    pub grace_period_secs: u64,
}

fn default_state_file() -> PathBuf {
    PathBuf::from(".local/ci/state.json")
}

fn default_run_root() -> PathBuf {
    PathBuf::from(".local/out/run")
}

fn default_fallback_log() -> PathBuf {
    PathBuf::from(".local/out/run/fallback.log")
}

fn default_timebox_min() -> u64 {
    20
}

fn default_grace_period_secs() -> u64 {
    10
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            run_root: default_run_root(),
            fallback_log: default_fallback_log(),
            default_timebox_min: default_timebox_min(),
            grace_period_secs: default_grace_period_secs(),
        }
    }
}

impl OrchestratorSection {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }

    /// Effective timebox: the CLI value if given, otherwise the configured default.
    pub fn timebox(&self, cli_minutes: Option<u64>) -> Duration {
        let minutes = cli_minutes.unwrap_or(self.default_timebox_min);
        Duration::from_secs(minutes.saturating_mul(60))
    }
}

/// `[preflight]` section: what the built-in `preflight` step checks for.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreflightSection {
    #[serde(default = "default_required_paths")]
    pub required_paths: Vec<PathBuf>,

    /// Each entry is a program followed by its arguments, e.g. `["go", "version"]`.
    #[serde(default = "default_required_commands")]
    pub required_commands: Vec<Vec<String>>,
}

fn default_required_paths() -> Vec<PathBuf> {
    [
        ".codex/00-RULES-READ-FIRST.md",
        "docs/ci/SYSTEM.md",
        "docs/ci/FLOW.md",
        "docs/ci/RUNNER_ISOLATION.md",
        "docs/ci/COLIMA_TUNING.md",
        "docs/ci/SHELL_POLICY.md",
        "docs/ci/RUNBOOK.md",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

fn default_required_commands() -> Vec<Vec<String>> {
    vec![
        vec!["docker".to_string(), "--version".to_string()],
        vec!["go".to_string(), "version".to_string()],
    ]
}

impl Default for PreflightSection {
    fn default() -> Self {
        Self {
            required_paths: default_required_paths(),
            required_commands: default_required_commands(),
        }
    }
}

/// `[step.<name>]` section.
///
/// Unset fields keep the built-in recipe value. Setting `status_file` makes
/// the step status-file-first.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepOverride {
    #[serde(default)]
    pub program: Option<String>,

    #[serde(default)]
    pub args: Option<Vec<String>>,

    #[serde(default)]
    pub status_file: Option<PathBuf>,
}
