// src/pipeline/step.rs

use std::fmt;
use std::str::FromStr;

use crate::errors::OrchError;

/// One named stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    Preflight,
    VerifyLite,
    FullBuild,
    FullTest,
    BundleMake,
    PrCreate,
}

/// The full pipeline, in execution order.
pub const PLAN: [Step; 6] = [
    Step::Preflight,
    Step::VerifyLite,
    Step::FullBuild,
    Step::FullTest,
    Step::BundleMake,
    Step::PrCreate,
];

impl Step {
    pub fn name(self) -> &'static str {
        match self {
            Step::Preflight => "preflight",
            Step::VerifyLite => "verify-lite",
            Step::FullBuild => "full-build",
            Step::FullTest => "full-test",
            Step::BundleMake => "bundle-make",
            Step::PrCreate => "pr-create",
        }
    }

    /// File name of this step's log inside the run directory.
    pub fn log_file_name(self) -> String {
        format!("{}.log", self.name())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Step {
    type Err = OrchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PLAN.iter()
            .copied()
            .find(|step| step.name() == s)
            .ok_or_else(|| OrchError::UnknownStep(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_planned_step_round_trips_through_its_name() {
        for step in PLAN {
            assert_eq!(step.name().parse::<Step>().unwrap(), step);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!(matches!(
            "deploy".parse::<Step>(),
            Err(OrchError::UnknownStep(name)) if name == "deploy"
        ));
    }
}
