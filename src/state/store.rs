// src/state/store.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::{OrchError, Result};
use crate::fs::FileSystem;
use crate::state::RunState;

/// Reads the run state once at start and writes it once at the end.
///
/// No locking: two concurrent invocations against the same file race, and
/// the last writer wins.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load persisted state. Missing or malformed state yields an empty state.
    pub fn load(&self) -> RunState {
        let contents = match self.fs.read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) => {
                debug!(path = %self.path.display(), error = %err, "no prior run state");
                return RunState::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(state) => state,
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "run state unreadable; starting from empty state"
                );
                RunState::default()
            }
        }
    }

    /// Persist `state` as pretty-printed JSON, creating parent directories.
    pub fn save(&self, state: &RunState) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(state)?;
        self.fs
            .write(&self.path, &bytes)
            .map_err(OrchError::Other)?;
        debug!(path = %self.path.display(), entries = state.entries().len(), "run state saved");
        Ok(())
    }
}
