//! Target directory preparation.
//!
//! Before a new release is extracted, every native binary under the
//! installation directory is removed so stale executables and libraries
//! from the previous version cannot linger. Everything else (save data,
//! configuration, directory structure) is left untouched.

use std::fs;
use std::path::{Path, PathBuf};

use camino::Utf8Path;
use log::{debug, info};

use crate::error::{Result, UpdateError};
use crate::platform::is_native_binary;
use crate::status::StatusSink;

/// Name of the probe file used to check writability.
const WRITE_PROBE: &str = ".simple64-updater-probe";

/// Prepares the installation directory for extraction.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectorySanitizer;

impl DirectorySanitizer {
    /// Ensure `target_dir` exists and is writable, then delete every native
    /// binary beneath it.
    ///
    /// Returns the paths of the removed files. The walk aborts on the first
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Io`] if the directory cannot be created or
    /// written, or if a binary cannot be removed.
    pub fn prepare(&self, target_dir: &Utf8Path, status: &dyn StatusSink) -> Result<Vec<PathBuf>> {
        status.report("Cleaning existing directory");

        fs::create_dir_all(target_dir)
            .map_err(|e| UpdateError::io(format!("could not create directory {target_dir}"), e))?;
        ensure_writable(target_dir)?;

        let mut removed = Vec::new();
        purge_binaries(target_dir.as_std_path(), &mut removed)
            .map_err(|e| match e {
                UpdateError::Io { context, source } => UpdateError::io(
                    format!("could not clean existing directory: {context}"),
                    source,
                ),
                other => other,
            })?;
        info!("removed {} stale binaries from {target_dir}", removed.len());
        Ok(removed)
    }
}

/// Verify writability by creating and deleting a probe file.
fn ensure_writable(dir: &Utf8Path) -> Result<()> {
    let probe = dir.join(WRITE_PROBE);
    fs::write(&probe, b"probe")
        .map_err(|e| UpdateError::io(format!("directory {dir} is not writable"), e))?;
    fs::remove_file(&probe)
        .map_err(|e| UpdateError::io(format!("could not remove probe file {probe}"), e))
}

fn purge_binaries(dir: &Path, removed: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir)
        .map_err(|e| UpdateError::io(format!("could not read {}", dir.display()), e))?;

    for entry in entries {
        let entry =
            entry.map_err(|e| UpdateError::io(format!("could not read {}", dir.display()), e))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| UpdateError::io(format!("could not stat {}", path.display()), e))?;

        if file_type.is_dir() {
            purge_binaries(&path, removed)?;
            continue;
        }

        if is_native_binary(&entry.file_name().to_string_lossy()) {
            debug!("removing {}", path.display());
            fs::remove_file(&path).map_err(|e| {
                UpdateError::io(format!("could not remove file {}", path.display()), e)
            })?;
            removed.push(path);
        }
    }
    Ok(())
}
