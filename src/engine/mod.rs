// src/engine/mod.rs

//! Plan driver.
//!
//! [`driver`] walks a single step or the full plan against a `RunState`,
//! honouring the stop flag between steps. [`report`] renders the stdout
//! line protocol.

pub mod driver;
pub mod report;

pub use driver::{ALREADY_STOPPED_REASON, PlanDriver, PlanOutcome};
pub use report::{Reporter, plan_line, step_line};
