//! Configuration file support for tcdeploy.
//!
//! tcdeploy reads two optional configuration files:
//! - Global: `~/.tcdeploy/config.toml` - user-wide defaults (typically the key)
//! - Project: `tcdeploy.toml` - project-specific settings
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.
//!
//! ```toml
//! key = "XXXX-XXXX-XXXX"
//! main_class = "com.acme.ui.MainApp"
//! platforms = ["android", "ios"]
//! must_compile = ["*/libs/*.jar"]
//!
//! [env]
//! JAVA_TOOL_OPTIONS = "-Xmx1g"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::config::{BuildConfigurationBuilder, ExitStatusPolicy, MustCompile};
use crate::core::platform::PlatformTarget;

/// File name of the project configuration.
pub const PROJECT_CONFIG_FILE: &str = "tcdeploy.toml";

/// tcdeploy configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Deploy key passed with `/r`
    pub key: Option<String>,

    /// Packager home directory (`TOTALCROSS3_HOME`)
    pub home: Option<String>,

    /// Runtime launcher (default `java`)
    pub runtime: Option<String>,

    /// Packager entry point (default `tc.Deploy`)
    pub entry_point: Option<String>,

    /// Package manifest path (default `all.pkg`)
    pub manifest: Option<PathBuf>,

    /// Main target path
    pub main_target: Option<String>,

    /// Main class; the target becomes `target/<Class>.jar`
    pub main_class: Option<String>,

    /// Classpath entries, in order
    pub classpath: Vec<String>,

    /// Platforms to deploy the main target for
    pub platforms: Vec<PlatformTarget>,

    /// Free-form packager arguments
    pub args: Vec<String>,

    /// Glob patterns selecting modules to compile as dependency libraries
    pub must_compile: Vec<String>,

    /// Extra environment variables for the packager
    pub env: BTreeMap<String, String>,

    /// How to treat a non-zero packager exit status
    pub exit_status: Option<ExitStatusPolicy>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration, falling back to defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.key.is_some() {
            self.key = other.key;
        }
        if other.home.is_some() {
            self.home = other.home;
        }
        if other.runtime.is_some() {
            self.runtime = other.runtime;
        }
        if other.entry_point.is_some() {
            self.entry_point = other.entry_point;
        }
        if other.manifest.is_some() {
            self.manifest = other.manifest;
        }
        if other.main_target.is_some() || other.main_class.is_some() {
            self.main_target = other.main_target;
            self.main_class = other.main_class;
        }
        if !other.classpath.is_empty() {
            self.classpath = other.classpath;
        }
        if !other.platforms.is_empty() {
            self.platforms = other.platforms;
        }
        if !other.args.is_empty() {
            self.args = other.args;
        }
        if !other.must_compile.is_empty() {
            self.must_compile = other.must_compile;
        }
        self.env.extend(other.env);
        if other.exit_status.is_some() {
            self.exit_status = other.exit_status;
        }
    }

    /// Compile the `must_compile` globs into a policy.
    pub fn must_compile_policy(&self) -> Result<MustCompile> {
        if self.must_compile.is_empty() {
            return Ok(MustCompile::never());
        }
        let patterns = self
            .must_compile
            .iter()
            .map(|p| {
                glob::Pattern::new(p).with_context(|| format!("invalid must_compile pattern: {}", p))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(MustCompile::matching(patterns))
    }

    /// Seed a configuration builder with these settings.
    pub fn to_builder(&self) -> Result<BuildConfigurationBuilder> {
        let mut builder = BuildConfigurationBuilder::default()
            .args(self.args.iter().cloned())
            .platforms(self.platforms.iter().copied())
            .must_compile(self.must_compile_policy()?);

        if let Some(ref key) = self.key {
            builder = builder.key(key);
        }
        if let Some(ref home) = self.home {
            builder = builder.home(home);
        }
        if let Some(ref runtime) = self.runtime {
            builder = builder.runtime(runtime);
        }
        if let Some(ref entry_point) = self.entry_point {
            builder = builder.entry_point(entry_point);
        }
        if let Some(ref manifest) = self.manifest {
            builder = builder.manifest_path(manifest);
        }
        if let Some(ref class) = self.main_class {
            builder = builder.main_class(class);
        }
        if let Some(ref target) = self.main_target {
            builder = builder.main_target(target);
        }
        for (key, value) in &self.env {
            builder = builder.env(key, value);
        }
        if let Some(policy) = self.exit_status {
            builder = builder.exit_status(policy);
        }

        Ok(builder)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (tcdeploy.toml)
/// 2. Global config (~/.tcdeploy/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path)?);
    }

    config.merge(Config::load_or_default(project_path)?);

    Ok(config)
}

/// Get the global tcdeploy config directory (~/.tcdeploy).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".tcdeploy"))
}

/// Get the global config path (~/.tcdeploy/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}
