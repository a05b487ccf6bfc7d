//! Update pipeline orchestration.
//!
//! [`UpdateOrchestrator`] runs the stages strictly in order:
//!
//! ```text
//! Idle -> WaitingForHostExit -> ResolvingRelease -> Downloading
//!      -> Sanitizing -> Extracting -> Done
//! ```
//!
//! The first failing stage ends the run; later stages never execute, so a
//! network failure cannot touch the installation directory. The outcome is
//! produced exactly once. [`spawn_update`] runs the orchestrator on its own
//! thread and hands back a one-shot [`Completion`].

use std::sync::mpsc::{self, Receiver};
use std::thread;

use log::{debug, error, info};

use crate::config::UpdaterConfig;
use crate::error::Result;
use crate::extract::ArchiveExtractor;
use crate::fetch::ArtifactFetcher;
use crate::http::HttpTransport;
use crate::release::ReleaseResolver;
use crate::sanitize::DirectorySanitizer;
use crate::status::StatusSink;

/// Stages of an update run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    /// Not started.
    Idle,
    /// Waiting for a running instance to release its files.
    WaitingForHostExit,
    /// Querying the release endpoint.
    ResolvingRelease,
    /// Downloading the release archive.
    Downloading,
    /// Removing stale binaries from the installation.
    Sanitizing,
    /// Unpacking the archive.
    Extracting,
    /// Finished, successfully or not.
    Done,
}

/// Terminal result of an update run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Every stage completed.
    Success,
    /// A stage failed with the given message.
    Failure(String),
}

impl PipelineOutcome {
    /// Return true for [`PipelineOutcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Outcome of a run together with the states it passed through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// How the run ended.
    pub outcome: PipelineOutcome,
    /// States entered, in order, excluding the initial `Idle`.
    pub history: Vec<PipelineState>,
}

/// Sequences release resolution, download, sanitisation, and extraction.
pub struct UpdateOrchestrator<'a> {
    config: &'a UpdaterConfig,
    transport: &'a dyn HttpTransport,
    status: &'a dyn StatusSink,
    state: PipelineState,
    history: Vec<PipelineState>,
}

impl<'a> UpdateOrchestrator<'a> {
    /// Create an orchestrator for one run.
    #[must_use]
    pub fn new(
        config: &'a UpdaterConfig,
        transport: &'a dyn HttpTransport,
        status: &'a dyn StatusSink,
    ) -> Self {
        Self {
            config,
            transport,
            status,
            state: PipelineState::Idle,
            history: Vec::new(),
        }
    }

    /// Run every stage and return the report.
    ///
    /// On failure the error message is reported to the status sink and
    /// held for `failure_hold`; on success the final status is held for
    /// `success_hold`.
    #[must_use]
    pub fn run(mut self) -> PipelineReport {
        let result = self.run_stages();
        self.enter(PipelineState::Done);

        let outcome = match result {
            Ok(()) => {
                info!("update of {} complete", self.config.target_dir);
                thread::sleep(self.config.success_hold);
                PipelineOutcome::Success
            }
            Err(err) => {
                let message = err.to_string();
                error!("update failed: {message}");
                self.status.report(&message);
                thread::sleep(self.config.failure_hold);
                PipelineOutcome::Failure(message)
            }
        };

        PipelineReport {
            outcome,
            history: self.history,
        }
    }

    fn run_stages(&mut self) -> Result<()> {
        let config = self.config;
        let status = self.status;

        self.enter(PipelineState::WaitingForHostExit);
        thread::sleep(config.host_exit_delay);

        self.enter(PipelineState::ResolvingRelease);
        let url = ReleaseResolver::new(self.transport, &config.release_url, &config.asset_marker)
            .resolve_download_url(status)?;

        self.enter(PipelineState::Downloading);
        let artifact = ArtifactFetcher::new(self.transport).fetch(&url, status)?;

        self.enter(PipelineState::Sanitizing);
        DirectorySanitizer.prepare(&config.target_dir, status)?;

        self.enter(PipelineState::Extracting);
        ArchiveExtractor::new(&config.root_segment).extract(&artifact, &config.target_dir, status)?;

        Ok(())
    }

    fn enter(&mut self, next: PipelineState) {
        debug_assert!(next > self.state, "{next:?} does not follow {:?}", self.state);
        debug!("pipeline: {:?} -> {next:?}", self.state);
        self.state = next;
        self.history.push(next);
    }
}

/// One-shot handle to the outcome of a background update.
#[derive(Debug)]
pub struct Completion {
    receiver: Receiver<PipelineOutcome>,
}

impl Completion {
    /// Block until the pipeline finishes and return its outcome.
    ///
    /// A pipeline thread that dies without reporting counts as a failure.
    #[must_use]
    pub fn wait(self) -> PipelineOutcome {
        self.receiver.recv().unwrap_or_else(|_| {
            PipelineOutcome::Failure("update pipeline stopped unexpectedly".to_owned())
        })
    }
}

/// Run the update pipeline on a dedicated thread.
///
/// The thread owns the configuration, transport, and status sink for the
/// whole run. The sink is dropped when the run ends, after the outcome has
/// been sent.
///
/// # Errors
///
/// Returns an error if the thread cannot be spawned.
pub fn spawn_update<T, S>(
    config: UpdaterConfig,
    transport: T,
    status: S,
) -> std::io::Result<Completion>
where
    T: HttpTransport + 'static,
    S: StatusSink + 'static,
{
    let (sender, receiver) = mpsc::sync_channel(1);
    thread::Builder::new()
        .name("update-pipeline".to_owned())
        .spawn(move || {
            let report = UpdateOrchestrator::new(&config, &transport, &status).run();
            if sender.send(report.outcome).is_err() {
                debug!("completion receiver dropped before the outcome was sent");
            }
            drop(status);
        })?;
    Ok(Completion { receiver })
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
