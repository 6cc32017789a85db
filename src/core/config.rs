//! Deploy configuration.
//!
//! [`BuildConfiguration`] is the immutable input to one orchestration run.
//! It is assembled with [`BuildConfigurationBuilder`] and validated once in
//! [`BuildConfigurationBuilder::build`], so a configuration value always
//! carries a non-empty key.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::naming::main_target_for;
use crate::core::platform::PlatformTarget;
use crate::util::errors::{DeployError, DeployResult};

/// Environment variable naming the packager's home directory.
pub const HOME_ENV_VAR: &str = "TOTALCROSS3_HOME";

/// Default launcher for the packager runtime.
pub const DEFAULT_RUNTIME: &str = "java";

/// Default packager entry point.
pub const DEFAULT_ENTRY_POINT: &str = "tc.Deploy";

/// Default shared package manifest, relative to the working directory.
pub const DEFAULT_MANIFEST: &str = "all.pkg";

/// How a non-zero packager exit status is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitStatusPolicy {
    /// A non-zero exit status fails the step.
    #[default]
    Strict,
    /// The exit status is logged and otherwise ignored.
    Ignore,
}

impl std::str::FromStr for ExitStatusPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(ExitStatusPolicy::Strict),
            "ignore" => Ok(ExitStatusPolicy::Ignore),
            _ => Err(format!(
                "invalid exit status policy '{}'; expected 'strict' or 'ignore'",
                s
            )),
        }
    }
}

/// Decides which classpath modules are compiled into dependency libraries.
#[derive(Clone)]
pub struct MustCompile(Arc<dyn Fn(&str) -> bool + Send + Sync>);

impl MustCompile {
    /// Wrap a predicate over module paths.
    pub fn new(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        MustCompile(Arc::new(f))
    }

    /// The default policy: compile nothing.
    pub fn never() -> Self {
        MustCompile::new(|_| false)
    }

    /// Compile modules whose path matches any of the glob patterns.
    pub fn matching(patterns: Vec<glob::Pattern>) -> Self {
        MustCompile::new(move |path| patterns.iter().any(|p| p.matches(path)))
    }

    /// Evaluate the policy for one module path.
    pub fn test(&self, module_path: &str) -> bool {
        (self.0)(module_path)
    }
}

impl Default for MustCompile {
    fn default() -> Self {
        MustCompile::never()
    }
}

impl fmt::Debug for MustCompile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MustCompile(..)")
    }
}

/// Validated configuration for one deploy run.
#[derive(Debug, Clone)]
pub struct BuildConfiguration {
    key: String,
    home: Option<String>,
    args: Vec<String>,
    env: Vec<(String, String)>,
    main_target: String,
    must_compile: MustCompile,
    platforms: Vec<PlatformTarget>,
    runtime: String,
    entry_point: String,
    manifest_path: PathBuf,
    exit_status: ExitStatusPolicy,
}

impl BuildConfiguration {
    /// Start building a configuration.
    pub fn builder() -> BuildConfigurationBuilder {
        BuildConfigurationBuilder::default()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn home(&self) -> Option<&str> {
        self.home.as_deref()
    }

    /// Free-form packager arguments, in the order they were added.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Extra environment variables, in insertion order.
    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    pub fn main_target(&self) -> &str {
        &self.main_target
    }

    pub fn must_compile(&self) -> &MustCompile {
        &self.must_compile
    }

    pub fn platforms(&self) -> &[PlatformTarget] {
        &self.platforms
    }

    pub fn runtime(&self) -> &str {
        &self.runtime
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn exit_status(&self) -> ExitStatusPolicy {
        self.exit_status
    }
}

/// Accumulates deploy settings before validation.
#[derive(Debug, Clone, Default)]
pub struct BuildConfigurationBuilder {
    key: Option<String>,
    home: Option<String>,
    args: Vec<String>,
    env: Vec<(String, String)>,
    main_target: Option<String>,
    must_compile: MustCompile,
    platforms: Vec<PlatformTarget>,
    runtime: Option<String>,
    entry_point: Option<String>,
    manifest_path: Option<PathBuf>,
    exit_status: ExitStatusPolicy,
}

impl BuildConfigurationBuilder {
    /// Set the packager key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the packager home directory. Leave unset to inherit it.
    pub fn home(mut self, home: impl Into<String>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Replace all free-form arguments.
    pub fn set_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Append free-form arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an extra environment variable for the packager.
    ///
    /// Setting the same name twice keeps its original position.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.env.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.env.push((key, value)),
        }
        self
    }

    /// Set the main target path directly.
    pub fn main_target(mut self, path: impl Into<String>) -> Self {
        self.main_target = Some(path.into());
        self
    }

    /// Derive the main target from a class name (`target/<Class>.jar`).
    pub fn main_class(self, class_name: &str) -> Self {
        self.main_class_with(class_name, ".jar", "target/")
    }

    /// Derive the main target from a class name with explicit extension and prefix.
    pub fn main_class_with(self, class_name: &str, extension: &str, prefix: &str) -> Self {
        let path = main_target_for(class_name, extension, prefix);
        self.main_target(path)
    }

    /// Set the policy selecting modules to compile as dependency libraries.
    pub fn must_compile(mut self, policy: MustCompile) -> Self {
        self.must_compile = policy;
        self
    }

    /// Append platforms to deploy the main target for.
    pub fn platforms(mut self, platforms: impl IntoIterator<Item = PlatformTarget>) -> Self {
        self.platforms.extend(platforms);
        self
    }

    /// Override the runtime launcher (default `java`).
    pub fn runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = Some(runtime.into());
        self
    }

    /// Override the packager entry point (default `tc.Deploy`).
    pub fn entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = Some(entry_point.into());
        self
    }

    /// Override the package manifest path (default `all.pkg`).
    pub fn manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }

    pub fn exit_status(mut self, policy: ExitStatusPolicy) -> Self {
        self.exit_status = policy;
        self
    }

    /// `/n <name>`
    pub fn name(self, name: impl Into<String>) -> Self {
        self.args(["/n".to_string(), name.into()])
    }

    /// `/o <dir>`
    pub fn output_dir(self, dir: impl Into<String>) -> Self {
        self.args(["/o".to_string(), dir.into()])
    }

    /// `/c <command>`
    pub fn command(self, cmd: impl Into<String>) -> Self {
        self.args(["/c".to_string(), cmd.into()])
    }

    /// `/m <path>`
    pub fn mobile_provision(self, path: impl Into<String>) -> Self {
        self.args(["/m".to_string(), path.into()])
    }

    /// `/p`
    pub fn single_package(self) -> Self {
        self.args(["/p"])
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> DeployResult<BuildConfiguration> {
        let key = match self.key {
            Some(key) if !key.trim().is_empty() => key,
            _ => return Err(DeployError::MissingKey),
        };

        Ok(BuildConfiguration {
            key,
            home: self.home,
            args: self.args,
            env: self.env,
            main_target: self.main_target.unwrap_or_default(),
            must_compile: self.must_compile,
            platforms: self.platforms,
            runtime: self.runtime.unwrap_or_else(|| DEFAULT_RUNTIME.to_string()),
            entry_point: self
                .entry_point
                .unwrap_or_else(|| DEFAULT_ENTRY_POINT.to_string()),
            manifest_path: self
                .manifest_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST)),
            exit_status: self.exit_status,
        })
    }
}
