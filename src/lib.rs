//! tcdeploy - Multi-platform deploy orchestrator for the TotalCross packager
//!
//! This crate provides the library side of tcdeploy: classpath handling,
//! dependency library planning, the transactional package manifest and the
//! packager invocation protocol.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities for tcdeploy unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides a recording process runner that stands in for the packager.
#[cfg(test)]
pub mod test_support;

pub use self::core::{
    classpath::ClasspathResolver,
    config::{BuildConfiguration, BuildConfigurationBuilder, ExitStatusPolicy, MustCompile},
    platform::PlatformTarget,
};

pub use ops::deploy::{BuildOrchestrator, BuildPhase, BuildReport};
pub use util::errors::{DeployError, DeployResult};
