//! Error types for the simple64 updater.
//!
//! Every stage of the update pipeline fails with an [`UpdateError`]. The
//! variants map onto a small taxonomy ([`ErrorKind`]) so the orchestrator
//! and tests can reason about *what* failed without matching on field
//! shapes. All errors are terminal for the current run.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Coarse classification of an [`UpdateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Request or transport failure, or a non-success HTTP status.
    Network,
    /// The release metadata was malformed.
    Parse,
    /// No release asset matched the platform marker.
    NotFound,
    /// The archive was corrupt or violated path-safety rules.
    Archive,
    /// A filesystem operation failed.
    Io,
}

/// Errors that can occur while updating an installation.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The request could not be completed.
    #[error("request to {url} failed: {reason}")]
    Network {
        /// The URL that was requested.
        url: String,
        /// Description of the transport failure.
        reason: String,
    },

    /// The server answered with a non-success status code.
    #[error("request to {url} failed, http status {status}")]
    HttpStatus {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code returned.
        status: u16,
    },

    /// The release metadata could not be parsed.
    #[error("error parsing release metadata: {reason}")]
    Parse {
        /// Description of the parse failure.
        reason: String,
    },

    /// No asset in the release matched the platform marker.
    #[error("could not determine download URL: no asset name contains \"{marker}\"")]
    AssetNotFound {
        /// The marker substring that was searched for.
        marker: String,
    },

    /// The archive is corrupt or one of its entries is unsafe.
    #[error("invalid archive: {reason}")]
    Archive {
        /// Description of the archive problem.
        reason: String,
    },

    /// A filesystem operation failed.
    #[error("{context}: {source}")]
    Io {
        /// What the updater was doing when the error occurred.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The updated program could not be started.
    #[error("could not launch {path}: {source}")]
    Launch {
        /// Path of the executable that failed to start.
        path: Utf8PathBuf,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },
}

impl UpdateError {
    /// Wrap an I/O error with a short description of the failed operation.
    ///
    /// # Examples
    ///
    /// ```
    /// use simple64_updater::error::{ErrorKind, UpdateError};
    ///
    /// let err = UpdateError::io("could not create directory", std::io::Error::other("denied"));
    /// assert_eq!(err.kind(), ErrorKind::Io);
    /// assert!(err.to_string().starts_with("could not create directory"));
    /// ```
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Shorthand for an [`UpdateError::Archive`] with the given reason.
    #[must_use]
    pub fn archive(reason: impl Into<String>) -> Self {
        Self::Archive {
            reason: reason.into(),
        }
    }

    /// Return the taxonomy bucket this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } | Self::HttpStatus { .. } => ErrorKind::Network,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::AssetNotFound { .. } => ErrorKind::NotFound,
            Self::Archive { .. } => ErrorKind::Archive,
            Self::Io { .. } | Self::Launch { .. } => ErrorKind::Io,
        }
    }
}

/// Result type alias using [`UpdateError`].
pub type Result<T> = std::result::Result<T, UpdateError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::network(
        UpdateError::Network { url: "https://x.test".to_owned(), reason: "reset".to_owned() },
        ErrorKind::Network
    )]
    #[case::status(
        UpdateError::HttpStatus { url: "https://x.test".to_owned(), status: 500 },
        ErrorKind::Network
    )]
    #[case::parse(UpdateError::Parse { reason: "eof".to_owned() }, ErrorKind::Parse)]
    #[case::not_found(
        UpdateError::AssetNotFound { marker: "simple64-win64".to_owned() },
        ErrorKind::NotFound
    )]
    #[case::archive(UpdateError::archive("bad header"), ErrorKind::Archive)]
    #[case::io(UpdateError::io("write", std::io::Error::other("full")), ErrorKind::Io)]
    fn kind_classifies_variants(#[case] err: UpdateError, #[case] expected: ErrorKind) {
        assert_eq!(err.kind(), expected);
    }

    #[test]
    fn http_status_message_includes_code() {
        let err = UpdateError::HttpStatus {
            url: "https://api.github.com/repos/simple64/simple64/releases/latest".to_owned(),
            status: 500,
        };
        let msg = err.to_string();
        assert!(msg.contains("http status 500"));
        assert!(msg.contains("releases/latest"));
    }

    #[test]
    fn asset_not_found_names_marker() {
        let err = UpdateError::AssetNotFound {
            marker: "simple64-win64".to_owned(),
        };
        assert!(err.to_string().contains("simple64-win64"));
    }

    #[test]
    fn io_error_preserves_source() {
        let err = UpdateError::io("could not remove file", std::io::Error::other("busy"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("busy"));
    }
}
