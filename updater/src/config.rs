//! Explicit configuration for one update run.
//!
//! [`UpdaterConfig`] is built once from the command line and threaded into
//! the orchestrator and every component that needs it; nothing reads
//! process arguments after startup.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};

use crate::platform::{default_asset_marker, executable_name};
use crate::retry::RetryPolicy;

/// Release-metadata endpoint for the latest simple64 release.
pub const DEFAULT_RELEASE_URL: &str =
    "https://api.github.com/repos/simple64/simple64/releases/latest";

/// Top-level directory shared by every entry of a release archive.
pub const DEFAULT_ROOT_SEGMENT: &str = "simple64";

/// Program started after a successful update.
pub const DEFAULT_EXECUTABLE: &str = "simple64-gui";

/// Time given to a running instance to exit and release its file locks.
pub const DEFAULT_HOST_EXIT_DELAY: Duration = Duration::from_secs(3);

/// How long the final success message stays visible.
pub const DEFAULT_SUCCESS_HOLD: Duration = Duration::from_secs(1);

/// How long an error message stays visible before the updater exits.
pub const DEFAULT_FAILURE_HOLD: Duration = Duration::from_secs(3);

/// Settings for one update run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdaterConfig {
    /// Installation directory to update.
    pub target_dir: Utf8PathBuf,
    /// Release-metadata endpoint.
    pub release_url: String,
    /// Substring identifying the asset built for this platform.
    pub asset_marker: String,
    /// Top-level archive directory stripped during extraction.
    pub root_segment: String,
    /// File name of the program launched after success.
    pub executable: String,
    /// Delay before the pipeline starts touching the installation.
    pub host_exit_delay: Duration,
    /// Pause after the success message.
    pub success_hold: Duration,
    /// Pause after a failure message.
    pub failure_hold: Duration,
    /// Retry behaviour for HTTP requests.
    pub retry: RetryPolicy,
}

impl UpdaterConfig {
    /// Create a configuration with platform defaults for `target_dir`.
    ///
    /// # Examples
    ///
    /// ```
    /// use simple64_updater::config::{DEFAULT_RELEASE_URL, UpdaterConfig};
    ///
    /// let config = UpdaterConfig::new("/opt/simple64");
    /// assert_eq!(config.release_url, DEFAULT_RELEASE_URL);
    /// assert_eq!(config.root_segment, "simple64");
    /// ```
    #[must_use]
    pub fn new(target_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            release_url: DEFAULT_RELEASE_URL.to_owned(),
            asset_marker: default_asset_marker().to_owned(),
            root_segment: DEFAULT_ROOT_SEGMENT.to_owned(),
            executable: executable_name(DEFAULT_EXECUTABLE),
            host_exit_delay: DEFAULT_HOST_EXIT_DELAY,
            success_hold: DEFAULT_SUCCESS_HOLD,
            failure_hold: DEFAULT_FAILURE_HOLD,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the release-metadata endpoint.
    #[must_use]
    pub fn with_release_url(mut self, url: impl Into<String>) -> Self {
        self.release_url = url.into();
        self
    }

    /// Override the asset marker substring.
    #[must_use]
    pub fn with_asset_marker(mut self, marker: impl Into<String>) -> Self {
        self.asset_marker = marker.into();
        self
    }

    /// Override the archive root segment.
    #[must_use]
    pub fn with_root_segment(mut self, root: impl Into<String>) -> Self {
        self.root_segment = root.into();
        self
    }

    /// Override the launched program; the platform suffix is appended.
    #[must_use]
    pub fn with_executable(mut self, base: &str) -> Self {
        self.executable = executable_name(base);
        self
    }

    /// Override the host-exit delay.
    #[must_use]
    pub const fn with_host_exit_delay(mut self, delay: Duration) -> Self {
        self.host_exit_delay = delay;
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Disable every pause: host-exit delay, success hold, failure hold,
    /// and retry backoff.
    #[must_use]
    pub const fn without_delays(mut self) -> Self {
        self.host_exit_delay = Duration::ZERO;
        self.success_hold = Duration::ZERO;
        self.failure_hold = Duration::ZERO;
        self.retry = RetryPolicy::none();
        self
    }

    /// The installation directory.
    #[must_use]
    pub fn target_dir(&self) -> &Utf8Path {
        &self.target_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_release_conventions() {
        let config = UpdaterConfig::new("/games/simple64");
        assert_eq!(config.asset_marker, default_asset_marker());
        assert_eq!(config.host_exit_delay, Duration::from_secs(3));
        assert_eq!(config.success_hold, Duration::from_secs(1));
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn executable_gets_platform_suffix() {
        let config = UpdaterConfig::new("/games/simple64").with_executable("simple64-gui");
        assert!(config.executable.starts_with("simple64-gui"));
        assert!(config.executable.ends_with(std::env::consts::EXE_SUFFIX));
    }

    #[test]
    fn without_delays_zeroes_every_pause() {
        let config = UpdaterConfig::new("/tmp/x").without_delays();
        assert_eq!(config.host_exit_delay, Duration::ZERO);
        assert_eq!(config.success_hold, Duration::ZERO);
        assert_eq!(config.failure_hold, Duration::ZERO);
        assert_eq!(config.retry.max_attempts(), 1);
    }

    #[test]
    fn overrides_replace_defaults() {
        let config = UpdaterConfig::new("/tmp/x")
            .with_release_url("http://127.0.0.1/latest")
            .with_asset_marker("simple64-win64")
            .with_root_segment("root");
        assert_eq!(config.release_url, "http://127.0.0.1/latest");
        assert_eq!(config.asset_marker, "simple64-win64");
        assert_eq!(config.root_segment, "root");
    }
}
