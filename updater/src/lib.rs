//! simple64 updater library.
//!
//! This crate replaces a simple64 installation with the latest published
//! release: it resolves the platform asset from the release API, downloads
//! the archive, removes stale native binaries, and extracts the new files.
//! It is used by the `simple64-updater` binary and can be driven
//! programmatically with any [`http::HttpTransport`] and
//! [`status::StatusSink`].
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Explicit per-run configuration
//! - [`error`] - Error taxonomy shared by every stage
//! - [`extract`] - ZIP extraction with root-segment stripping
//! - [`fetch`] - Artifact download into memory
//! - [`http`] - HTTP transport seam and the retrying `ureq` implementation
//! - [`launch`] - Detached launch of the updated program
//! - [`pipeline`] - Update orchestration and the background runner
//! - [`platform`] - Platform asset markers and native-binary detection
//! - [`release`] - Release metadata parsing and asset selection
//! - [`retry`] - Bounded exponential backoff
//! - [`sanitize`] - Stale-binary removal from the installation directory
//! - [`status`] - Status reporting and the textual display loop

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod http;
pub mod launch;
pub mod pipeline;
pub mod platform;
pub mod release;
pub mod retry;
pub mod sanitize;
pub mod status;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
