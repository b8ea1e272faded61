// src/config/validate.rs

use std::str::FromStr;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{OrchError, Result};
use crate::pipeline::{Recipe, Step, builtin_recipe};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = OrchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(
            raw.orchestrator,
            raw.preflight,
            raw.step,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_orchestrator(cfg)?;
    validate_preflight(cfg)?;
    validate_step_overrides(cfg)?;
    Ok(())
}

fn validate_orchestrator(cfg: &RawConfigFile) -> Result<()> {
    if cfg.orchestrator.default_timebox_min == 0 {
        return Err(OrchError::ConfigError(
            "[orchestrator].default_timebox_min must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.orchestrator.grace_period_secs == 0 {
        return Err(OrchError::ConfigError(
            "[orchestrator].grace_period_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_preflight(cfg: &RawConfigFile) -> Result<()> {
    for (idx, command) in cfg.preflight.required_commands.iter().enumerate() {
        if command.first().is_none_or(|program| program.trim().is_empty()) {
            return Err(OrchError::ConfigError(format!(
                "[preflight].required_commands[{idx}] must start with a program name"
            )));
        }
    }
    Ok(())
}

fn validate_step_overrides(cfg: &RawConfigFile) -> Result<()> {
    for (name, over) in cfg.step.iter() {
        let step = Step::from_str(name).map_err(|_| {
            OrchError::ConfigError(format!("[step.{name}] does not name a known step"))
        })?;

        match builtin_recipe(step) {
            Recipe::External(_) => {}
            Recipe::Preflight | Recipe::Manual => {
                return Err(OrchError::ConfigError(format!(
                    "[step.{name}] cannot be overridden: it does not run an external program"
                )));
            }
        }

        if let Some(program) = &over.program {
            if program.trim().is_empty() {
                return Err(OrchError::ConfigError(format!(
                    "[step.{name}].program must not be empty"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::StepOverride;

    fn raw_with_override(name: &str, over: StepOverride) -> RawConfigFile {
        let mut raw = RawConfigFile::default();
        raw.step.insert(name.to_string(), over);
        raw
    }

    #[test]
    fn unknown_step_override_is_rejected() {
        let raw = raw_with_override("deploy", StepOverride::default());
        match ConfigFile::try_from(raw) {
            Err(OrchError::ConfigError(msg)) => assert!(msg.contains("deploy")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn manual_step_override_is_rejected() {
        let raw = raw_with_override(
            "pr-create",
            StepOverride {
                program: Some("gh".into()),
                ..StepOverride::default()
            },
        );
        assert!(matches!(
            ConfigFile::try_from(raw),
            Err(OrchError::ConfigError(_))
        ));
    }

    #[test]
    fn zero_grace_period_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.orchestrator.grace_period_secs = 0;
        assert!(ConfigFile::try_from(raw).is_err());
    }

    #[test]
    fn empty_required_command_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.preflight.required_commands = vec![vec![]];
        assert!(ConfigFile::try_from(raw).is_err());
    }

    #[test]
    fn external_override_is_accepted() {
        let raw = raw_with_override(
            "full-build",
            StepOverride {
                program: Some("podman".into()),
                ..StepOverride::default()
            },
        );
        let cfg = ConfigFile::try_from(raw).unwrap();
        assert_eq!(cfg.step["full-build"].program.as_deref(), Some("podman"));
    }
}
