//! Error types for deploy orchestration.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error raised while planning or running a deploy.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("must set a deploy key before building")]
    MissingKey,

    #[error("no main target configured")]
    MissingTarget,

    #[error("invalid platform `{0}`, valid values: win32, android, ios, wp8, wince, winmo, linux")]
    InvalidPlatform(String),

    #[error("failed to {op} manifest `{}`", path.display())]
    ManifestIo {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for `{program}`")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` exited with {}", describe_code(*code))]
    ExitStatus { program: String, code: Option<i32> },

    #[error("failed to compile dependency library for `{module}`")]
    Dependency {
        module: String,
        #[source]
        source: Box<DeployError>,
    },

    #[error("failed to deploy `{target}`")]
    Deploy {
        target: String,
        #[source]
        source: Box<DeployError>,
    },
}

impl DeployError {
    /// Build a manifest I/O error for the given operation.
    pub fn manifest(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        DeployError::ManifestIo {
            op,
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from the manifest file rather than the tool.
    pub fn is_manifest_io(&self) -> bool {
        match self {
            DeployError::ManifestIo { .. } => true,
            DeployError::Dependency { source, .. } | DeployError::Deploy { source, .. } => {
                source.is_manifest_io()
            }
            _ => false,
        }
    }
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Convenience alias used across the library.
pub type DeployResult<T> = Result<T, DeployError>;
