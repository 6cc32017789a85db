//! Transactional edits to the shared package manifest.
//!
//! The packager reads `all.pkg` to learn which libraries to bundle. While the
//! main target is deployed, the manifest must list every dependency library
//! generated in this run; afterwards it must be returned to exactly what it
//! was before:
//!
//! - manifest existed: it is copied to `<manifest>-bkp`, appended to, and the
//!   backup is moved back over it on release
//! - manifest did not exist: it is created, and deleted on release
//! - no libraries generated: nothing is touched
//!
//! Release happens once, either through [`ManifestTransaction::end`] or, on
//! any other exit path, when the transaction is dropped.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::util::errors::{DeployError, DeployResult};

/// Suffix appended to the manifest file name for its backup copy.
pub const BACKUP_SUFFIX: &str = "-bkp";

/// Path of the backup copy for a manifest.
pub fn backup_path(manifest: &Path) -> PathBuf {
    let mut name = manifest
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(BACKUP_SUFFIX);
    manifest.with_file_name(name)
}

/// Render the manifest lines for generated libraries.
pub fn render_entries(libraries: &[String], separator: bool) -> String {
    let mut out = String::new();
    if separator {
        out.push('\n');
    }
    for lib in libraries {
        out.push_str("[L] ");
        out.push_str(lib);
        out.push('\n');
    }
    out
}

#[derive(Debug)]
enum Release {
    /// Move the backup back over the manifest.
    Restore { manifest: PathBuf, backup: PathBuf },
    /// Remove the manifest created by this transaction.
    Delete { manifest: PathBuf },
}

/// Scoped mutation of the package manifest.
#[derive(Debug)]
pub struct ManifestTransaction {
    pending: Option<Release>,
}

impl ManifestTransaction {
    /// Record `libraries` in the manifest at `manifest`.
    ///
    /// With no libraries this returns an inactive transaction and performs
    /// no I/O.
    pub fn begin(manifest: &Path, libraries: &[String]) -> DeployResult<Self> {
        if libraries.is_empty() {
            tracing::debug!("no generated libraries, leaving {} untouched", manifest.display());
            return Ok(ManifestTransaction { pending: None });
        }

        let existed = manifest
            .try_exists()
            .map_err(|e| DeployError::manifest("inspect", manifest, e))?;

        let release = if existed {
            let backup = backup_path(manifest);
            tracing::debug!("backing up {} to {}", manifest.display(), backup.display());
            fs::copy(manifest, &backup)
                .map_err(|e| DeployError::manifest("back up", manifest, e))?;
            Release::Restore {
                manifest: manifest.to_path_buf(),
                backup,
            }
        } else {
            Release::Delete {
                manifest: manifest.to_path_buf(),
            }
        };

        let mut txn = ManifestTransaction {
            pending: Some(release),
        };

        if let Err(err) = write_entries(manifest, libraries, existed) {
            if let Err(release_err) = txn.release() {
                tracing::error!("{:#}", anyhow::Error::new(release_err));
            }
            return Err(err);
        }

        tracing::debug!(
            "recorded {} librar{} in {}",
            libraries.len(),
            if libraries.len() == 1 { "y" } else { "ies" },
            manifest.display()
        );
        Ok(txn)
    }

    /// Whether this transaction still has a pending release.
    pub fn is_active(&self) -> bool {
        self.pending.is_some()
    }

    /// Release the transaction, restoring or removing the manifest.
    pub fn end(mut self) -> DeployResult<()> {
        self.release()
    }

    fn release(&mut self) -> DeployResult<()> {
        match self.pending.take() {
            None => Ok(()),
            Some(Release::Restore { manifest, backup }) => {
                tracing::debug!("restoring {} from {}", manifest.display(), backup.display());
                fs::rename(&backup, &manifest)
                    .map_err(|e| DeployError::manifest("restore", manifest, e))
            }
            Some(Release::Delete { manifest }) => {
                tracing::debug!("removing generated {}", manifest.display());
                fs::remove_file(&manifest)
                    .map_err(|e| DeployError::manifest("remove", manifest, e))
            }
        }
    }
}

impl Drop for ManifestTransaction {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            tracing::error!("{:#}", anyhow::Error::new(err));
        }
    }
}

fn write_entries(manifest: &Path, libraries: &[String], append: bool) -> DeployResult<()> {
    let mut options = OpenOptions::new();
    if append {
        options.append(true);
    } else {
        options.write(true).create(true).truncate(true);
    }

    let mut file = options
        .open(manifest)
        .map_err(|e| DeployError::manifest("open", manifest, e))?;
    file.write_all(render_entries(libraries, append).as_bytes())
        .and_then(|()| file.flush())
        .map_err(|e| DeployError::manifest("write", manifest, e))
}
