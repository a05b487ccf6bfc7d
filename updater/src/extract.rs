//! ZIP extraction into the installation directory.
//!
//! Release archives store every entry under one top-level directory (the
//! *root segment*, e.g. `simple64/`). Extraction strips that segment and
//! writes the remainder beneath the target directory. Entries outside the
//! root segment, or that would escape the target directory, abort the
//! extraction before anything is written for them.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Write};
use std::path::{Component, Path, PathBuf};

use camino::Utf8Path;
use log::{debug, info};
use zip::ZipArchive;

use crate::error::{Result, UpdateError};
use crate::fetch::DownloadedArtifact;
use crate::status::StatusSink;

/// Buffer size for copying entry contents.
const COPY_CHUNK: usize = 8 * 1024;

/// Mode applied to files whose entry carries no Unix permissions.
const DEFAULT_FILE_MODE: u32 = 0o644;

/// Counts of what an extraction wrote.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionSummary {
    /// Regular files written.
    pub files: usize,
    /// Directory entries created.
    pub directories: usize,
}

/// Unpacks release archives, stripping the shared root segment.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveExtractor<'a> {
    root_segment: &'a str,
}

enum CopyError {
    Read(io::Error),
    Write(io::Error),
}

impl<'a> ArchiveExtractor<'a> {
    /// Create an extractor stripping `root_segment` from every entry.
    #[must_use]
    pub const fn new(root_segment: &'a str) -> Self {
        Self { root_segment }
    }

    /// Extract `artifact` into `target_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Archive`] if the bytes are not a valid ZIP
    /// archive, an entry lies outside the root segment or escapes the
    /// target directory, or an entry's content is corrupt or truncated.
    /// Returns [`UpdateError::Io`] if a directory or file cannot be created
    /// or written.
    pub fn extract(
        &self,
        artifact: &DownloadedArtifact,
        target_dir: &Utf8Path,
        status: &dyn StatusSink,
    ) -> Result<ExtractionSummary> {
        status.report("Extracting ZIP archive");
        debug!(
            "opening archive of {} bytes (declared {:?})",
            artifact.len(),
            artifact.declared_length
        );

        let mut archive = ZipArchive::new(Cursor::new(artifact.bytes.as_slice()))
            .map_err(|e| UpdateError::archive(format!("could not open ZIP: {e}")))?;

        let mut summary = ExtractionSummary::default();
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(|e| {
                UpdateError::archive(format!("could not open ZIP entry {index}: {e}"))
            })?;
            let name = entry.name().to_owned();
            let relative = self.strip_root(&name, entry.enclosed_name())?;
            let output = target_dir.as_std_path().join(&relative);

            if entry.is_dir() {
                fs::create_dir_all(&output).map_err(|e| {
                    UpdateError::io(format!("could not create directory {}", output.display()), e)
                })?;
                summary.directories += 1;
                continue;
            }

            if relative.as_os_str().is_empty() {
                return Err(UpdateError::archive(format!(
                    "file entry {name} has no path below {}/",
                    self.root_segment
                )));
            }

            let mode = entry_mode(entry.unix_mode());
            let expected = entry.size();
            debug!("extracting {name} -> {} ({expected} bytes)", output.display());
            write_entry(&mut entry, &output, mode, expected, &name)?;
            summary.files += 1;
        }

        info!(
            "extracted {} file(s) and {} directory entries into {target_dir}",
            summary.files, summary.directories
        );
        status.report("Done extracting ZIP archive");
        Ok(summary)
    }

    /// Remove the root segment from an entry path.
    ///
    /// `enclosed` is the entry path as validated by the ZIP reader; it is
    /// `None` when the stored name is absolute or climbs above the archive.
    fn strip_root(&self, name: &str, enclosed: Option<PathBuf>) -> Result<PathBuf> {
        let enclosed = enclosed.ok_or_else(|| {
            UpdateError::archive(format!("entry {name} escapes the archive root"))
        })?;

        let mut components = enclosed.components();
        match components.next() {
            Some(Component::Normal(first)) if first == OsStr::new(self.root_segment) => {}
            _ => {
                return Err(UpdateError::archive(format!(
                    "could not determine file path: entry {name} is not inside {}/",
                    self.root_segment
                )));
            }
        }

        let mut relative = PathBuf::new();
        for component in components {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(UpdateError::archive(format!(
                        "entry {name} escapes the target directory"
                    )));
                }
            }
        }
        Ok(relative)
    }
}

/// Resolve the permission bits for a file entry.
///
/// The owner-write bit is always set so the next update can truncate the
/// file in place.
fn entry_mode(stored: Option<u32>) -> u32 {
    match stored.map(|mode| mode & 0o7777) {
        Some(0) | None => DEFAULT_FILE_MODE,
        Some(mode) => mode | 0o200,
    }
}

fn write_entry(
    entry: &mut dyn Read,
    output: &Path,
    mode: u32,
    expected: u64,
    name: &str,
) -> Result<()> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            UpdateError::io(format!("could not create directory {}", parent.display()), e)
        })?;
    }

    let mut file = open_output(output, mode)
        .map_err(|e| UpdateError::io(format!("could not create file {}", output.display()), e))?;

    let written = match copy_chunked(entry, &mut file) {
        Ok(written) => written,
        Err(CopyError::Read(e)) => {
            return Err(UpdateError::archive(format!("could not read entry {name}: {e}")));
        }
        Err(CopyError::Write(e)) => {
            return Err(UpdateError::io(
                format!("could not copy file {}", output.display()),
                e,
            ));
        }
    };
    file.flush()
        .map_err(|e| UpdateError::io(format!("could not copy file {}", output.display()), e))?;

    if written != expected {
        return Err(UpdateError::archive(format!(
            "entry {name} is truncated: wrote {written} of {expected} bytes"
        )));
    }

    apply_mode(output, mode).map_err(|e| {
        UpdateError::io(
            format!("could not set permissions on {}", output.display()),
            e,
        )
    })
}

/// Copy `reader` to `writer` in fixed-size chunks until end of stream.
///
/// Only a zero-length read marks the end; interrupted reads are retried.
fn copy_chunked(
    reader: &mut dyn Read,
    writer: &mut dyn Write,
) -> std::result::Result<u64, CopyError> {
    let mut buffer = [0_u8; COPY_CHUNK];
    let mut total: u64 = 0;
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => return Ok(total),
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };
        let chunk = buffer.get(..read).unwrap_or(&buffer);
        writer.write_all(chunk).map_err(CopyError::Write)?;
        total += read as u64;
    }
}

#[cfg(unix)]
fn open_output(path: &Path, mode: u32) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)
}

#[cfg(not(unix))]
fn open_output(path: &Path, _mode: u32) -> io::Result<File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[path = "extract_tests.rs"]
mod tests;
