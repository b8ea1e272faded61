// src/pipeline/recipe.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::config::ConfigFile;
use crate::pipeline::step::{PLAN, Step};

/// How a finished external step is judged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arbitration {
    /// Exit code zero is OK, anything else is ERROR.
    ExitCode,
    /// The artifact at this path decides; the exit code is never consulted.
    StatusFile(PathBuf),
}

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Literal command text recorded in results and state.
    pub fn command_text(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalRecipe {
    pub invocation: Invocation,
    pub arbitration: Arbitration,
}

/// Execution recipe of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipe {
    /// Spawn a subprocess under supervision.
    External(ExternalRecipe),
    /// Built-in readiness check, no subprocess under supervision.
    Preflight,
    /// Performed by a human; always SKIP.
    Manual,
}

/// Built-in recipe of every step, before config overrides.
pub fn builtin_recipe(step: Step) -> Recipe {
    match step {
        Step::Preflight => Recipe::Preflight,
        Step::VerifyLite => Recipe::External(ExternalRecipe {
            invocation: Invocation::new("go", ["run", "./cmd/verify-lite"]),
            arbitration: Arbitration::StatusFile(PathBuf::from("out/verify-lite.status")),
        }),
        Step::FullBuild => Recipe::External(ExternalRecipe {
            invocation: Invocation::new(
                "docker",
                [
                    "build",
                    "-t",
                    "ci-self-runner:local",
                    "-f",
                    "ci/image/Dockerfile",
                    ".",
                ],
            ),
            arbitration: Arbitration::ExitCode,
        }),
        Step::FullTest => Recipe::External(ExternalRecipe {
            invocation: Invocation::new("sh", ["ops/ci/run_verify_full.sh"]),
            arbitration: Arbitration::StatusFile(PathBuf::from("out/verify-full.status")),
        }),
        Step::BundleMake => Recipe::External(ExternalRecipe {
            invocation: Invocation::new("go", ["run", "./cmd/review-pack"]),
            arbitration: Arbitration::ExitCode,
        }),
        Step::PrCreate => Recipe::Manual,
    }
}

/// Step -> recipe lookup used by the step runner.
#[derive(Debug, Clone, Default)]
pub struct RecipeBook {
    recipes: BTreeMap<Step, Recipe>,
}

impl RecipeBook {
    /// A book with no recipes at all. Every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let recipes = PLAN.iter().map(|&step| (step, builtin_recipe(step))).collect();
        Self { recipes }
    }

    /// Built-in recipes with `[step.<name>]` overrides applied.
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let mut book = Self::builtin();

        for (name, over) in cfg.step.iter() {
            let Ok(step) = Step::from_str(name) else {
                warn!(step = %name, "ignoring override for unknown step");
                continue;
            };
            let Some(Recipe::External(recipe)) = book.recipes.get_mut(&step) else {
                warn!(step = %name, "ignoring override for non-external step");
                continue;
            };

            if let Some(program) = &over.program {
                recipe.invocation.program = program.clone();
            }
            if let Some(args) = &over.args {
                recipe.invocation.args = args.clone();
            }
            if let Some(status_file) = &over.status_file {
                recipe.arbitration = Arbitration::StatusFile(status_file.clone());
            }
        }

        book
    }

    pub fn insert(&mut self, step: Step, recipe: Recipe) {
        self.recipes.insert(step, recipe);
    }

    pub fn get(&self, step: Step) -> Option<&Recipe> {
        self.recipes.get(&step)
    }
}
