//! Release discovery: find the download URL of the latest platform build.
//!
//! The release API returns a JSON document with an `assets` list. The
//! document is deserialised once into [`ReleaseMetadata`]; any deviation
//! from the expected shape is a parse error. Asset selection scans the
//! whole list and the *last* asset whose name contains the marker wins.

use log::{debug, info};
use serde::Deserialize;

use crate::error::{Result, UpdateError};
use crate::http::HttpTransport;
use crate::status::StatusSink;

/// One downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetDescriptor {
    /// File name of the asset.
    pub name: String,
    /// Direct download URL.
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
}

/// The subset of release metadata the updater relies on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseMetadata {
    /// Assets in the order the API listed them.
    pub assets: Vec<AssetDescriptor>,
}

impl ReleaseMetadata {
    /// Parse release metadata from a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Parse`] if the body is not JSON or lacks an
    /// `assets` list of `{name, browser_download_url}` objects.
    ///
    /// # Examples
    ///
    /// ```
    /// use simple64_updater::release::ReleaseMetadata;
    ///
    /// let body = br#"{"assets":[{"name":"a.zip","browser_download_url":"https://x/a.zip"}]}"#;
    /// let metadata = ReleaseMetadata::from_json(body).expect("valid metadata");
    /// assert_eq!(metadata.assets.len(), 1);
    /// ```
    pub fn from_json(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| UpdateError::Parse {
            reason: e.to_string(),
        })
    }

    /// Return the download URL of the last asset whose name contains `marker`.
    #[must_use]
    pub fn select_download_url(&self, marker: &str) -> Option<&str> {
        self.assets
            .iter()
            .rev()
            .find(|asset| asset.name.contains(marker))
            .map(|asset| asset.download_url.as_str())
    }
}

/// Resolves the download URL of the latest release for this platform.
pub struct ReleaseResolver<'a> {
    transport: &'a dyn HttpTransport,
    release_url: &'a str,
    marker: &'a str,
}

impl<'a> ReleaseResolver<'a> {
    /// Create a resolver querying `release_url` and matching `marker`.
    #[must_use]
    pub fn new(transport: &'a dyn HttpTransport, release_url: &'a str, marker: &'a str) -> Self {
        Self {
            transport,
            release_url,
            marker,
        }
    }

    /// Query the release endpoint and select the platform asset.
    ///
    /// # Errors
    ///
    /// Returns a network error if the request fails, [`UpdateError::Parse`]
    /// for malformed metadata, and [`UpdateError::AssetNotFound`] if no
    /// asset name contains the marker.
    pub fn resolve_download_url(&self, status: &dyn StatusSink) -> Result<String> {
        status.report("Determining latest release");
        info!("querying {}", self.release_url);

        let response = self.transport.get(self.release_url)?;
        let metadata = ReleaseMetadata::from_json(&response.body)?;
        debug!("release lists {} asset(s)", metadata.assets.len());

        let url = metadata
            .select_download_url(self.marker)
            .ok_or_else(|| UpdateError::AssetNotFound {
                marker: self.marker.to_owned(),
            })?;
        info!("selected asset {url}");
        Ok(url.to_owned())
    }
}

#[cfg(test)]
#[path = "release_tests.rs"]
mod tests;
