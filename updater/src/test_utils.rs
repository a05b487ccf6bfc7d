//! Shared test utilities for the updater crate.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::{Result, UpdateError};
use crate::http::{HttpResponse, HttpTransport};
use crate::status::StatusSink;

/// Canned outcome for one URL served by [`StubTransport`].
#[derive(Debug, Clone)]
pub enum StubResponse {
    /// Successful response with the given body; `Content-Length` matches.
    Body(Vec<u8>),
    /// Successful response whose `Content-Length` header is the given value.
    BodyWithLength(Vec<u8>, Option<u64>),
    /// Non-success HTTP status.
    Status(u16),
    /// Transport failure with the given reason.
    Network(String),
}

/// An [`HttpTransport`] serving canned responses keyed by URL.
///
/// Every request is recorded so tests can assert which stages ran.
#[derive(Debug, Default)]
pub struct StubTransport {
    responses: HashMap<String, StubResponse>,
    requests: Mutex<Vec<String>>,
}

impl StubTransport {
    /// Create a transport with no stubbed URLs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` for `url`.
    #[must_use]
    pub fn with(mut self, url: &str, response: StubResponse) -> Self {
        self.responses.insert(url.to_owned(), response);
        self
    }

    /// URLs requested so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl HttpTransport for StubTransport {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_owned());
        match self.responses.get(url).cloned() {
            Some(StubResponse::Body(body)) => {
                let content_length = u64::try_from(body.len()).ok();
                Ok(HttpResponse {
                    body,
                    content_length,
                })
            }
            Some(StubResponse::BodyWithLength(body, content_length)) => Ok(HttpResponse {
                body,
                content_length,
            }),
            Some(StubResponse::Status(status)) => Err(UpdateError::HttpStatus {
                url: url.to_owned(),
                status,
            }),
            Some(StubResponse::Network(reason)) => Err(UpdateError::Network {
                url: url.to_owned(),
                reason,
            }),
            None => Err(UpdateError::Network {
                url: url.to_owned(),
                reason: "no stubbed response".to_owned(),
            }),
        }
    }
}

/// A [`StatusSink`] that records every reported status.
#[derive(Debug, Default)]
pub struct RecordingSink {
    statuses: Mutex<Vec<String>>,
}

impl RecordingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Statuses reported so far, in order.
    #[must_use]
    pub fn statuses(&self) -> Vec<String> {
        self.statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StatusSink for RecordingSink {
    fn report(&self, status: &str) {
        self.statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(status.to_owned());
    }
}

/// Builds ZIP archives in memory.
///
/// # Panics
///
/// Every method panics if the underlying writer fails; it is intended for
/// test fixtures only.
pub struct ZipBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
}

impl Default for ZipBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ZipBuilder {
    /// Start an empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Add a regular file with mode `0o644`.
    #[must_use]
    pub fn file(self, name: &str, contents: &[u8]) -> Self {
        self.file_with_mode(name, contents, 0o644)
    }

    /// Add a regular file with the given Unix permission bits.
    #[must_use]
    pub fn file_with_mode(mut self, name: &str, contents: &[u8], mode: u32) -> Self {
        let options = SimpleFileOptions::default().unix_permissions(mode);
        self.writer
            .start_file(name, options)
            .expect("start zip entry");
        self.writer.write_all(contents).expect("write zip entry");
        self
    }

    /// Add an explicit directory entry.
    #[must_use]
    pub fn directory(mut self, name: &str) -> Self {
        let options = SimpleFileOptions::default().unix_permissions(0o755);
        self.writer
            .add_directory(name, options)
            .expect("add zip directory");
        self
    }

    /// Finish the archive and return its bytes.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.writer.finish().expect("finish zip").into_inner()
    }
}

/// Build a release-metadata JSON body listing `(name, url)` assets in order.
#[must_use]
pub fn release_json(assets: &[(&str, &str)]) -> Vec<u8> {
    let assets: Vec<serde_json::Value> = assets
        .iter()
        .map(|(name, url)| {
            serde_json::json!({
                "name": name,
                "browser_download_url": url,
                "size": 1024,
            })
        })
        .collect();
    serde_json::json!({ "tag_name": "v1.2.0", "assets": assets })
        .to_string()
        .into_bytes()
}

/// Contents of a directory tree keyed by `/`-separated relative path.
///
/// Directories map to `None`, files to their bytes.
pub type TreeSnapshot = BTreeMap<String, Option<Vec<u8>>>;

/// Record every directory and file beneath `root`.
///
/// # Panics
///
/// Panics if the tree cannot be read.
#[must_use]
pub fn snapshot_tree(root: &Path) -> TreeSnapshot {
    let mut snapshot = TreeSnapshot::new();
    collect_tree(root, "", &mut snapshot);
    snapshot
}

fn collect_tree(dir: &Path, prefix: &str, snapshot: &mut TreeSnapshot) {
    for entry in fs::read_dir(dir).expect("read directory") {
        let entry = entry.expect("read directory entry");
        let name = format!("{prefix}{}", entry.file_name().to_string_lossy());
        let path = entry.path();
        if entry.file_type().expect("file type").is_dir() {
            collect_tree(&path, &format!("{name}/"), snapshot);
            snapshot.insert(name, None);
        } else {
            snapshot.insert(name, Some(fs::read(&path).expect("read file")));
        }
    }
}
