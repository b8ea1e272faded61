// src/exec/mod.rs

//! Step execution layer.
//!
//! - [`supervisor`] spawns one process with a timebox and graceful interrupt.
//! - [`arbiter`] turns a supervision outcome into OK / SKIP / ERROR.
//! - [`log_sink`] opens the per-step log, with a fallback location.
//! - [`step_runner`] ties these together for one step.
//! - [`backend`] defines the `StepExecutor` trait the plan driver uses.

pub mod arbiter;
pub mod backend;
pub mod log_sink;
pub mod step_runner;
pub mod supervisor;

pub use backend::StepExecutor;
pub use step_runner::{StepRequest, StepRunner};
pub use supervisor::{ExitReport, ProcessSupervisor, Supervision};
