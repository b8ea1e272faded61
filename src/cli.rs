// src/cli.rs

//! CLI argument parsing using `clap`, and resolution into a [`Command`].
//!
//! Parse failures are not fatal: they come back as `OrchError::CliError` so
//! the caller can record them as the `cli` step outcome.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};

use crate::errors::{OrchError, Result};
use crate::pipeline::{PLAN, Step};

/// Command word that runs the whole plan.
pub const RUN_PLAN: &str = "run-plan";

/// Command-line arguments for `ci-orch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ci-orch",
    version,
    about = "Run the CI step plan with timeboxes, status files and durable run state.",
    long_about = None,
    after_help = "Commands: preflight, verify-lite, full-build, full-test, bundle-make, pr-create, run-plan"
)]
pub struct CliArgs {
    /// A step name, or `run-plan` for the full plan.
    #[arg(value_name = "COMMAND", default_value = RUN_PLAN)]
    pub command: String,

    /// Per-step timebox in minutes (must be at least 1).
    ///
    /// If omitted, `default_timebox_min` from the config is used.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub timebox_min: Option<u64>,

    /// Path to the config file (TOML). Default: `CiOrch.toml` if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CI_ORCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// What the invocation asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Usage (or version) text to print.
    Help(String),
    RunStep(Step),
    RunPlan,
}

/// A fully resolved invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub timebox_min: Option<u64>,
    pub config: Option<PathBuf>,
    pub log_level: Option<LogLevel>,
}

impl Invocation {
    fn help(text: String) -> Self {
        Self {
            command: Command::Help(text),
            timebox_min: None,
            config: None,
            log_level: None,
        }
    }
}

impl TryFrom<CliArgs> for Invocation {
    type Error = OrchError;

    fn try_from(args: CliArgs) -> Result<Self> {
        let command = resolve_command(&args.command)?;
        Ok(Self {
            command,
            timebox_min: args.timebox_min,
            config: args.config,
            log_level: args.log_level,
        })
    }
}

fn resolve_command(word: &str) -> Result<Command> {
    if word == RUN_PLAN {
        return Ok(Command::RunPlan);
    }
    match word.parse::<Step>() {
        Ok(step) => Ok(Command::RunStep(step)),
        Err(_) => Err(OrchError::CliError(format!(
            "unknown command: {word} (expected one of {}, {RUN_PLAN})",
            PLAN.map(|s| s.name()).join(", ")
        ))),
    }
}

/// Parse and resolve `args` (including the program name).
pub fn parse_from<I, T>(args: I) -> Result<Invocation>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match CliArgs::try_parse_from(args) {
        Ok(parsed) => Invocation::try_from(parsed),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                Ok(Invocation::help(err.render().to_string()))
            }
            _ => Err(OrchError::CliError(clap_message(&err))),
        },
    }
}

/// Parse the process arguments.
pub fn parse() -> Result<Invocation> {
    parse_from(std::env::args_os())
}

/// First line of a clap error, without the `error: ` prefix.
fn clap_message(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.trim_start_matches("error: ").trim().to_string()
}
