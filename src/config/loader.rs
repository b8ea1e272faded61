// src/config/loader.rs

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Load the config the way the binary does.
///
/// - `explicit = true` (the user passed `--config`): the file must exist.
/// - `explicit = false`: a missing file means "use built-in defaults".
///
/// Parse and validation errors are returned in both cases.
pub fn load_or_default(path: impl AsRef<Path>, explicit: bool) -> Result<ConfigFile> {
    let path = path.as_ref();
    if !explicit {
        if let Err(err) = fs::metadata(path) {
            if err.kind() == ErrorKind::NotFound {
                debug!(path = %path.display(), "no config file; using built-in defaults");
                return Ok(ConfigFile::default());
            }
        }
    }
    load_and_validate(path)
}

/// Config path used when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("CiOrch.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::OrchError;

    #[test]
    fn missing_default_config_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_or_default(dir.path().join("CiOrch.toml"), false).unwrap();
        assert_eq!(cfg.orchestrator.default_timebox_min, 20);
        assert!(cfg.step.is_empty());
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_or_default(dir.path().join("nope.toml"), true).unwrap_err();
        assert!(matches!(err, OrchError::IoError(_)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CiOrch.toml");
        fs::write(&path, "[orchestrator]\ntimebox = 3\n").unwrap();

        let err = load_or_default(&path, false).unwrap_err();
        assert!(matches!(err, OrchError::TomlError(_)));
    }
}
