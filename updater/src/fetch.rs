//! Artifact download into memory.

use log::{info, warn};

use crate::error::Result;
use crate::http::HttpTransport;
use crate::status::StatusSink;

/// A downloaded release archive, held entirely in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedArtifact {
    /// The archive bytes.
    pub bytes: Vec<u8>,
    /// Length announced by the server; a size hint only.
    pub declared_length: Option<u64>,
}

impl DownloadedArtifact {
    /// Number of bytes actually received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Return true if no bytes were received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Downloads the selected release asset.
pub struct ArtifactFetcher<'a> {
    transport: &'a dyn HttpTransport,
}

impl<'a> ArtifactFetcher<'a> {
    /// Create a fetcher using `transport`.
    #[must_use]
    pub fn new(transport: &'a dyn HttpTransport) -> Self {
        Self { transport }
    }

    /// Download `url` into memory.
    ///
    /// Transient failures are retried by the transport.
    ///
    /// # Errors
    ///
    /// Returns a network error if the download fails or the server answers
    /// with a non-success status.
    pub fn fetch(&self, url: &str, status: &dyn StatusSink) -> Result<DownloadedArtifact> {
        status.report("Downloading latest release");
        info!("downloading {url}");

        let response = self.transport.get(url)?;
        let artifact = DownloadedArtifact {
            bytes: response.body,
            declared_length: response.content_length,
        };

        if artifact.is_empty() {
            warn!("server returned an empty body for {url}");
        }
        match artifact.declared_length {
            Some(declared) if u64::try_from(artifact.len()).ok() != Some(declared) => warn!(
                "server declared {declared} bytes but {} were received",
                artifact.len()
            ),
            _ => info!("downloaded {} bytes", artifact.len()),
        }
        Ok(artifact)
    }
}
