// src/exec/log_sink.rs

//! Per-step log file.
//!
//! The orchestrator writes its own header lines into it, then hands the same
//! file to the child as both stdout and stderr.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tracing::warn;

/// An open step log.
#[derive(Debug)]
pub struct LogSink {
    file: File,
    path: PathBuf,
}

/// Neither the primary nor the fallback log could be created.
#[derive(Debug)]
pub struct LogOpenFailure {
    /// Path reported as the step's log path even though nothing was written.
    pub fallback_path: PathBuf,
    pub primary_error: io::Error,
    pub fallback_error: io::Error,
}

impl LogOpenFailure {
    pub fn reason(&self) -> String {
        format!(
            "reason=log_open_failed(primary={} fallback={})",
            self.primary_error, self.fallback_error
        )
    }
}

impl LogSink {
    /// Create `primary` (and its parent dirs). On failure, try `fallback`.
    pub fn open_with_fallback(primary: &Path, fallback: &Path) -> Result<Self, LogOpenFailure> {
        let primary_error = match Self::create(primary) {
            Ok(sink) => return Ok(sink),
            Err(err) => err,
        };

        warn!(
            path = %primary.display(),
            error = %primary_error,
            fallback = %fallback.display(),
            "could not open step log; using fallback"
        );

        Self::create(fallback).map_err(|fallback_error| LogOpenFailure {
            fallback_path: fallback.to_path_buf(),
            primary_error,
            fallback_error,
        })
    }

    fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Path actually in use (primary or fallback).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A fresh handle on the log file, suitable for a child's stdout/stderr.
    pub fn stdio(&self) -> io::Result<Stdio> {
        Ok(Stdio::from(self.file.try_clone()?))
    }

    /// Append one line. Write errors are logged and otherwise ignored.
    pub fn line(&mut self, text: &str) {
        if let Err(err) = writeln!(self.file, "{text}") {
            warn!(path = %self.path.display(), error = %err, "failed to write step log");
        }
    }
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
