// src/pipeline/mod.rs

//! What the pipeline consists of.
//!
//! - [`step`]: the closed set of steps and the fixed [`PLAN`] order.
//! - [`recipe`]: how each step is executed (program, args, arbitration mode).
//! - [`preflight`]: the built-in readiness check behind the `preflight` step.

pub mod preflight;
pub mod recipe;
pub mod step;

pub use recipe::{Arbitration, ExternalRecipe, Invocation, Recipe, RecipeBook, builtin_recipe};
pub use step::{PLAN, Step};
