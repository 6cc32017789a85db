//! Test utilities for deploy orchestration.
//!
//! [`RecordingRunner`] stands in for the packager: it records every command
//! it is asked to run, optionally snapshots the package manifest at that
//! moment, and can be scripted to fail for specific targets.
//!
//! # Example
//!
//! ```rust,ignore
//! let runner = RecordingRunner::new()
//!     .watch_manifest(tmp.path().join("all.pkg"))
//!     .exit_code_for("target/App.jar", 1);
//! ```

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::Mutex;

use crate::util::errors::{DeployError, DeployResult};
use crate::util::process::{ProcessBuilder, ProcessRunner};

/// One recorded packager invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
    /// Manifest content at the time of the call, `None` if it did not exist.
    pub manifest: Option<String>,
}

impl RecordedCall {
    /// The target argument (`<runtime> -cp <cp> <entry> <target> ...`).
    pub fn target(&self) -> &str {
        self.args.get(3).map(String::as_str).unwrap_or("")
    }

    /// Platform flags passed to this call, without their dash.
    pub fn platform_flags(&self) -> Vec<&str> {
        self.args
            .iter()
            .skip(6)
            .filter_map(|a| a.strip_prefix('-'))
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Exit(i32),
    SpawnFailure,
}

/// Process runner that records calls instead of spawning processes.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    manifest: Option<PathBuf>,
    outcomes: HashMap<String, Outcome>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        RecordingRunner::default()
    }

    /// Snapshot this manifest file on every call.
    pub fn watch_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest = Some(path.into());
        self
    }

    /// Make calls for `target` exit with `code`.
    pub fn exit_code_for(mut self, target: &str, code: i32) -> Self {
        self.outcomes.insert(target.to_string(), Outcome::Exit(code));
        self
    }

    /// Make calls for `target` fail to spawn.
    pub fn spawn_failure_for(mut self, target: &str) -> Self {
        self.outcomes
            .insert(target.to_string(), Outcome::SpawnFailure);
        self
    }

    /// All calls recorded so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, cmd: &ProcessBuilder) -> DeployResult<ExitStatus> {
        let call = RecordedCall {
            program: cmd.get_program().to_string(),
            args: cmd.get_args().to_vec(),
            envs: cmd.get_envs().to_vec(),
            manifest: self
                .manifest
                .as_ref()
                .and_then(|p| std::fs::read_to_string(p).ok()),
        };
        let outcome = self.outcomes.get(call.target()).copied();
        self.calls.lock().unwrap().push(call);

        match outcome {
            None => Ok(exit_status(0)),
            Some(Outcome::Exit(code)) => Ok(exit_status(code)),
            Some(Outcome::SpawnFailure) => Err(DeployError::Spawn {
                program: cmd.get_program().to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "mock spawn failure"),
            }),
        }
    }
}

/// Build an `ExitStatus` carrying `code`.
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

/// Build an `ExitStatus` carrying `code`.
#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(code as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_status_round_trip() {
        assert!(exit_status(0).success());
        assert_eq!(exit_status(4).code(), Some(4));
    }

    #[test]
    fn test_records_calls() {
        let runner = RecordingRunner::new().exit_code_for("bad.jar", 1);
        let cmd = ProcessBuilder::new("java")
            .args(["-cp", "x", "tc.Deploy", "bad.jar", "/r", "K", "-ios"]);

        let status = runner.run(&cmd).unwrap();
        assert_eq!(status.code(), Some(1));

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].target(), "bad.jar");
        assert_eq!(calls[0].platform_flags(), vec!["ios"]);
        assert_eq!(calls[0].manifest, None);
    }
}
