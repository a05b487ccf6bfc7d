//! simple64 updater CLI entrypoint.
//!
//! Runs the update pipeline on a worker thread while the main thread shows
//! its status on stderr, then starts the updated program if the run
//! succeeded.

use std::io::Write;

use clap::Parser;
use simple64_updater::cli::Cli;
use simple64_updater::config::UpdaterConfig;
use simple64_updater::error::{Result, UpdateError};
use simple64_updater::http::UreqTransport;
use simple64_updater::launch::launch_detached;
use simple64_updater::pipeline::{PipelineOutcome, spawn_update};
use simple64_updater::status::{display_statuses, status_channel};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        // A subscriber is already installed; keep it.
    }
}

/// Returns the pipeline outcome once any launch has been attempted.
fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<PipelineOutcome> {
    let config = cli.to_config();
    write_stderr_line(stderr, "Initializing");

    let outcome = update(&config, stderr)?;
    if !outcome.is_success() {
        return Ok(outcome);
    }
    if cli.no_launch {
        log::info!("launch skipped (--no-launch)");
    } else {
        launch_detached(config.target_dir(), &config.executable)?;
    }
    Ok(outcome)
}

/// Run the pipeline in the background and display its status until done.
fn update(config: &UpdaterConfig, stderr: &mut dyn Write) -> Result<PipelineOutcome> {
    let (handle, mut receiver) = status_channel();
    let transport = UreqTransport::new(config.retry);
    let completion = spawn_update(config.clone(), transport, handle)
        .map_err(|e| UpdateError::io("could not start update thread", e))?;

    display_statuses(&mut receiver, stderr);
    Ok(completion.wait())
}

fn exit_code_for_run_result(result: Result<PipelineOutcome>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(PipelineOutcome::Success) => 0,
        // Already shown as the final status.
        Ok(PipelineOutcome::Failure(_)) => 1,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}
