//! CLI argument definitions for the simple64 updater.
//!
//! Arguments are parsed once in `main` and converted into an
//! [`UpdaterConfig`]; nothing else in the crate reads the command line.

use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;

use crate::config::{DEFAULT_EXECUTABLE, DEFAULT_RELEASE_URL, UpdaterConfig};
use crate::retry::RetryPolicy;

/// Update a simple64 installation to the latest release.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "simple64-updater")]
#[command(version, about)]
#[command(long_about = concat!(
    "Update a simple64 installation to the latest release.\n\n",
    "The updater waits for a running simple64 to exit, downloads the newest ",
    "release archive for this platform, removes stale executables and ",
    "libraries from the installation directory, unpacks the archive in ",
    "place, and starts simple64 again. Save data and configuration files ",
    "are left untouched.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Update an installation and relaunch it:\n",
    "    $ simple64-updater ~/simple64\n\n",
    "  Update without relaunching, with debug logging:\n",
    "    $ simple64-updater --no-launch -vv ~/simple64\n\n",
    "  Use a different release endpoint:\n",
    "    $ simple64-updater --release-url http://localhost:8080/latest ~/simple64",
))]
pub struct Cli {
    /// Installation directory to update.
    #[arg(value_name = "TARGET_DIR")]
    pub target_dir: Utf8PathBuf,

    /// Release-metadata endpoint.
    #[arg(long, value_name = "URL", default_value = DEFAULT_RELEASE_URL)]
    pub release_url: String,

    /// Substring identifying this platform's release asset [default: platform-specific].
    #[arg(long, value_name = "TEXT")]
    pub asset_marker: Option<String>,

    /// Program started after a successful update; the platform suffix is added.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_EXECUTABLE)]
    pub executable: String,

    /// Seconds to wait for a running instance to exit.
    #[arg(long, value_name = "SECS", default_value_t = 3)]
    pub host_exit_delay: u64,

    /// Retries for transient network failures.
    #[arg(long, value_name = "N", default_value_t = 3)]
    pub retries: u32,

    /// Do not start the program after updating.
    #[arg(long)]
    pub no_launch: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Build the run configuration from the parsed arguments.
    #[must_use]
    pub fn to_config(&self) -> UpdaterConfig {
        let mut config = UpdaterConfig::new(self.target_dir.clone())
            .with_release_url(self.release_url.clone())
            .with_executable(&self.executable)
            .with_host_exit_delay(Duration::from_secs(self.host_exit_delay))
            .with_retry(RetryPolicy::default().with_max_retries(self.retries));
        if let Some(marker) = &self.asset_marker {
            config = config.with_asset_marker(marker.clone());
        }
        config
    }

    /// Default log filter directive for the requested verbosity.
    #[must_use]
    pub const fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
