//! Subprocess execution utilities.

use std::ffi::OsStr;
use std::process::{Command, ExitStatus, Stdio};

use crate::util::errors::{DeployError, DeployResult};

/// Builder for a packager subprocess.
///
/// Environment overrides are applied on top of the inherited environment in
/// insertion order, so a later entry for the same name wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessBuilder {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl Into<String>) -> Self {
        ProcessBuilder {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env
            .push((key.as_ref().to_string(), value.as_ref().to_string()));
        self
    }

    /// Get the program.
    pub fn get_program(&self) -> &str {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Environment overrides, in application order.
    pub fn get_envs(&self) -> &[(String, String)] {
        &self.env
    }

    /// Effective value of an overridden variable, if any.
    pub fn get_env(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn build_command(&self) -> Command {
        let program = which::which(&self.program)
            .map(|p| p.into_os_string())
            .unwrap_or_else(|_| self.program.clone().into());
        let mut cmd = Command::new(program);
        cmd.args(&self.args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        cmd
    }

    /// Spawn with inherited stdio and block until the process exits.
    pub fn status(&self) -> DeployResult<ExitStatus> {
        let mut child = self
            .build_command()
            .spawn()
            .map_err(|source| DeployError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        child.wait().map_err(|source| DeployError::Wait {
            program: self.program.clone(),
            source,
        })
    }

    /// Display the command for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Launches packager processes.
///
/// The orchestrator only talks to this trait so that tests can record
/// invocations instead of spawning a JVM.
pub trait ProcessRunner {
    /// Run the command to completion and return its exit status.
    fn run(&self, cmd: &ProcessBuilder) -> DeployResult<ExitStatus>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, cmd: &ProcessBuilder) -> DeployResult<ExitStatus> {
        cmd.status()
    }
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, cmd: &ProcessBuilder) -> DeployResult<ExitStatus> {
        (**self).run(cmd)
    }
}
