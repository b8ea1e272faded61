// src/exec/arbiter.rs

//! Decide a step's status from its supervision outcome.
//!
//! Exit-code steps are judged by the exit code. Status-file steps are judged
//! only by the artifact their tool wrote: the first line holding a marker
//! wins, and a missing or marker-less file is an ERROR. A timeout is SKIP in
//! both modes and the artifact is not read.

use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Result;
use tracing::{debug, warn};

use crate::exec::supervisor::Supervision;
use crate::fs::FileSystem;
use crate::pipeline::Arbitration;
use crate::types::{StepStatus, Verdict};

/// Recognised markers, checked in this order within a line.
const MARKERS: [(&str, StepStatus); 3] = [
    ("status=OK", StepStatus::Ok),
    ("status=ERROR", StepStatus::Error),
    ("status=SKIP", StepStatus::Skip),
];

pub fn arbitrate(
    arbitration: &Arbitration,
    supervision: &Supervision,
    fs: &dyn FileSystem,
) -> Verdict {
    match supervision {
        Supervision::SpawnFailed(err) => Verdict::error(format!("reason=spawn_failed({err})")),
        Supervision::TimedOut { .. } => Verdict::skip("reason=timebox_exceeded"),
        Supervision::Exited(report) => match arbitration {
            Arbitration::StatusFile(path) => judge_status_file(path, fs),
            Arbitration::ExitCode if report.success => Verdict::ok("reason=command_ok"),
            Arbitration::ExitCode => {
                let detail = match report.code {
                    Some(code) => format!("exit_code={code}"),
                    None => "signal".to_string(),
                };
                Verdict::error(format!("reason=command_failed({detail})"))
            }
        },
        Supervision::WaitFailed(err) => match arbitration {
            Arbitration::StatusFile(path) => {
                debug!(error = %err, "wait failed; status artifact still decides");
                judge_status_file(path, fs)
            }
            Arbitration::ExitCode => Verdict::error(format!("reason=wait_failed({err})")),
        },
    }
}

fn judge_status_file(path: &Path, fs: &dyn FileSystem) -> Verdict {
    let shown = path.display();
    match read_status_marker(path, fs) {
        Ok(Some(status)) => Verdict::new(status, format!("reason=status_file({shown})")),
        Ok(None) => Verdict::error(format!("reason=status_file_no_marker({shown})")),
        Err(err) => {
            warn!(path = %shown, error = %err, "status artifact unreadable");
            Verdict::error(format!("reason=status_file_unreadable({shown})"))
        }
    }
}

/// Scan `path` line by line and return the first marker found.
pub fn read_status_marker(path: &Path, fs: &dyn FileSystem) -> Result<Option<StepStatus>> {
    let reader = BufReader::new(fs.open_read(path)?);

    for line in reader.split(b'\n') {
        let line = line?;
        let line = String::from_utf8_lossy(&line);
        if let Some(status) = marker_in(&line) {
            return Ok(Some(status));
        }
    }
    Ok(None)
}

fn marker_in(line: &str) -> Option<StepStatus> {
    MARKERS
        .iter()
        .find(|(marker, _)| line.contains(marker))
        .map(|&(_, status)| status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::supervisor::ExitReport;
    use crate::fs::mock::MockFileSystem;
    use std::path::PathBuf;

    const STATUS_PATH: &str = "out/verify-lite.status";

    fn exited(code: i32) -> Supervision {
        Supervision::Exited(ExitReport {
            success: code == 0,
            code: Some(code),
        })
    }

    fn status_file() -> Arbitration {
        Arbitration::StatusFile(PathBuf::from(STATUS_PATH))
    }

    #[test]
    fn artifact_error_beats_clean_exit() {
        let fs = MockFileSystem::new();
        fs.add_file(STATUS_PATH, "head: verify-lite status=ERROR\nstatus=ERROR\n");

        let verdict = arbitrate(&status_file(), &exited(0), &fs);

        assert_eq!(verdict.status, StepStatus::Error);
        assert_eq!(verdict.reason, "reason=status_file(out/verify-lite.status)");
    }

    #[test]
    fn artifact_ok_beats_failing_exit() {
        let fs = MockFileSystem::new();
        fs.add_file(STATUS_PATH, "lint warnings: 3\nstatus=OK\n");

        let verdict = arbitrate(&status_file(), &exited(1), &fs);

        assert_eq!(verdict.status, StepStatus::Ok);
    }

    #[test]
    fn first_marker_wins() {
        let fs = MockFileSystem::new();
        fs.add_file(STATUS_PATH, "noise\nstatus=SKIP\nstatus=OK\n");

        let verdict = arbitrate(&status_file(), &exited(0), &fs);

        assert_eq!(verdict.status, StepStatus::Skip);
    }

    #[test]
    fn markers_are_case_sensitive() {
        let fs = MockFileSystem::new();
        fs.add_file(STATUS_PATH, "STATUS=OK\nstatus=ok\n");

        let verdict = arbitrate(&status_file(), &exited(0), &fs);

        assert_eq!(
            verdict,
            Verdict::error("reason=status_file_no_marker(out/verify-lite.status)")
        );
    }

    #[test]
    fn missing_artifact_is_an_error() {
        let fs = MockFileSystem::new();

        let verdict = arbitrate(&status_file(), &exited(0), &fs);

        assert_eq!(
            verdict,
            Verdict::error("reason=status_file_unreadable(out/verify-lite.status)")
        );
    }

    #[test]
    fn timeout_skips_without_reading_the_artifact() {
        let fs = MockFileSystem::new();
        fs.add_file(STATUS_PATH, "status=ERROR\n");

        for exited_during_grace in [true, false] {
            let verdict = arbitrate(
                &status_file(),
                &Supervision::TimedOut {
                    exited_during_grace,
                },
                &fs,
            );
            assert_eq!(verdict, Verdict::skip("reason=timebox_exceeded"));
        }
    }

    #[test]
    fn exit_code_mode_maps_zero_and_non_zero() {
        let fs = MockFileSystem::new();

        assert_eq!(
            arbitrate(&Arbitration::ExitCode, &exited(0), &fs),
            Verdict::ok("reason=command_ok")
        );
        assert_eq!(
            arbitrate(&Arbitration::ExitCode, &exited(2), &fs),
            Verdict::error("reason=command_failed(exit_code=2)")
        );
    }

    #[test]
    fn spawn_failure_is_an_error_in_any_mode() {
        let fs = MockFileSystem::new();
        let failed = Supervision::SpawnFailed("No such file or directory".into());

        for mode in [Arbitration::ExitCode, status_file()] {
            let verdict = arbitrate(&mode, &failed, &fs);
            assert_eq!(
                verdict,
                Verdict::error("reason=spawn_failed(No such file or directory)")
            );
        }
    }

    #[test]
    fn wait_failure_still_consults_the_artifact() {
        let fs = MockFileSystem::new();
        fs.add_file(STATUS_PATH, "status=OK\n");

        let verdict = arbitrate(&status_file(), &Supervision::WaitFailed("EINTR".into()), &fs);

        assert_eq!(verdict.status, StepStatus::Ok);
    }
}
