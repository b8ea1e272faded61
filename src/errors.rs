// src/errors.rs

//! Crate-wide error type and `Result` alias.
//!
//! Only setup problems (CLI, config, state encoding) are errors. A step that
//! fails is not an error here: it becomes an ERROR `StepResult`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("State encoding error: {0}")]
    StateEncoding(#[from] serde_json::Error),

    #[error("Unknown step: {0}")]
    UnknownStep(String),

    #[error("{0}")]
    CliError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, OrchError>;
