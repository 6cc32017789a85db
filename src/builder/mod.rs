//! Packager driver.
//!
//! This module assembles packager command lines and guards the shared
//! package manifest while the packager runs.

pub mod invoker;
pub mod manifest;

pub use invoker::DeployInvoker;
pub use manifest::ManifestTransaction;
