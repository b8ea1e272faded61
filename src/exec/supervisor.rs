// src/exec/supervisor.rs

//! Process supervision: spawn, timebox, graceful interrupt.
//!
//! The child is waited on by a background Tokio task while the caller races
//! that task against the timebox. On timeout the child gets SIGINT and a
//! bounded grace period. It is never killed: a tool interrupted mid-write is
//! better left to finish on its own than have its artifacts truncated.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::task::JoinError;
use tracing::{debug, info, warn};

use crate::exec::log_sink::LogSink;
use crate::pipeline::Invocation;

/// Line appended to the step log when the child outlives the grace period.
pub const GRACE_EXPIRED_LOG_LINE: &str = "ERROR: timebox_exceeded process_did_not_exit_after_sigint";

/// Exit information of a child that finished on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    pub success: bool,
    /// `None` when the child was terminated by a signal.
    pub code: Option<i32>,
}

impl From<ExitStatus> for ExitReport {
    fn from(status: ExitStatus) -> Self {
        Self {
            success: status.success(),
            code: status.code(),
        }
    }
}

/// What happened to a supervised process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Supervision {
    /// Finished before the timebox elapsed.
    Exited(ExitReport),
    /// The child was started but waiting on it failed.
    WaitFailed(String),
    /// The timebox elapsed; SIGINT was sent.
    TimedOut { exited_during_grace: bool },
    /// The program could not be started.
    SpawnFailed(String),
}

#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
    grace: Duration,
}

impl ProcessSupervisor {
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Run `invocation` with stdout and stderr going to `log`.
    ///
    /// Returns after the child exits, or after `timebox + grace` at most.
    pub async fn supervise(
        &self,
        invocation: &Invocation,
        log: &mut LogSink,
        timebox: Duration,
    ) -> Supervision {
        let (stdout, stderr) = match (log.stdio(), log.stdio()) {
            (Ok(out), Ok(err)) => (out, err),
            (Err(e), _) | (_, Err(e)) => {
                return Supervision::SpawnFailed(format!("log handle: {e}"));
            }
        };

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(false);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                warn!(program = %invocation.program, error = %err, "failed to spawn step process");
                return Supervision::SpawnFailed(err.to_string());
            }
        };

        let pid = child.id();
        info!(
            program = %invocation.program,
            pid,
            timebox_ms = timebox.as_millis() as u64,
            "step process started"
        );

        let mut waiter = tokio::spawn(async move { child.wait().await });

        tokio::select! {
            biased;
            joined = &mut waiter => return finished(joined),
            _ = tokio::time::sleep(timebox) => {}
        }

        warn!(
            pid,
            timebox_ms = timebox.as_millis() as u64,
            "timebox exceeded; sending SIGINT"
        );
        interrupt(pid);

        match tokio::time::timeout(self.grace, &mut waiter).await {
            Ok(joined) => {
                debug!(pid, outcome = ?finished(joined), "process exited during grace period");
                Supervision::TimedOut {
                    exited_during_grace: true,
                }
            }
            Err(_) => {
                warn!(
                    pid,
                    grace_ms = self.grace.as_millis() as u64,
                    "process did not exit after SIGINT; leaving it to the OS"
                );
                log.line(GRACE_EXPIRED_LOG_LINE);
                // Dropping the waiter drops the `Child` without killing it.
                waiter.abort();
                Supervision::TimedOut {
                    exited_during_grace: false,
                }
            }
        }
    }
}

fn finished(joined: Result<io::Result<ExitStatus>, JoinError>) -> Supervision {
    match joined {
        Ok(Ok(status)) => {
            let report = ExitReport::from(status);
            info!(exit_code = ?report.code, success = report.success, "step process exited");
            Supervision::Exited(report)
        }
        Ok(Err(err)) => Supervision::WaitFailed(err.to_string()),
        Err(err) => Supervision::WaitFailed(err.to_string()),
    }
}

#[cfg(unix)]
fn interrupt(pid: Option<u32>) {
    use nix::errno::Errno;
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let Some(raw) = pid.and_then(|p| i32::try_from(p).ok()) else {
        debug!("no pid to interrupt; process already reaped");
        return;
    };

    match signal::kill(Pid::from_raw(raw), Signal::SIGINT) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(err) => warn!(pid = raw, error = %err, "SIGINT delivery failed"),
    }
}

#[cfg(not(unix))]
fn interrupt(pid: Option<u32>) {
    warn!(?pid, "graceful interrupt unsupported on this platform; waiting out the grace period");
}
