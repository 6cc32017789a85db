//! High-level operations.
//!
//! This module contains the implementation of tcdeploy commands.

pub mod deploy;

pub use deploy::{
    BuildOrchestrator, BuildPhase, BuildReport, InvocationKind, PlannedInvocation,
};
