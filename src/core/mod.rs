//! Core data structures for tcdeploy.
//!
//! This module contains the foundational types used throughout tcdeploy:
//! - Deploy platforms and their packager flags
//! - Classpath normalization
//! - Artifact naming
//! - The validated build configuration

pub mod classpath;
pub mod config;
pub mod naming;
pub mod platform;

pub use classpath::{ClasspathResolver, HostFamily};
pub use config::{BuildConfiguration, BuildConfigurationBuilder, ExitStatusPolicy, MustCompile};
pub use platform::PlatformTarget;
