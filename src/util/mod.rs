//! Shared utilities

pub mod config;
pub mod errors;
pub mod process;

pub use config::Config;
pub use errors::{DeployError, DeployResult};
pub use process::{ProcessBuilder, ProcessRunner, SystemRunner};
