//! Start the updated program as a detached process.

use std::process::{Command, Stdio};

use camino::Utf8Path;
use log::info;

use crate::error::{Result, UpdateError};

#[cfg(windows)]
const DETACHED_PROCESS: u32 = 0x0000_0008;

/// Start `target_dir/executable` without waiting for it.
///
/// The child runs in `target_dir` with null stdio. On Unix it is placed in
/// its own process group so it outlives the updater's terminal session.
/// A relative `target_dir` is resolved against the current directory.
///
/// # Errors
///
/// Returns [`UpdateError::Launch`] if the process cannot be spawned.
pub fn launch_detached(target_dir: &Utf8Path, executable: &str) -> Result<()> {
    let path = target_dir.join(executable);
    // The child changes into `target_dir` before resolving the program.
    let program = std::path::absolute(&path).map_err(|source| UpdateError::Launch {
        path: path.clone(),
        source,
    })?;
    let mut command = Command::new(&program);
    command
        .current_dir(target_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    detach(&mut command);

    let child = command.spawn().map_err(|source| UpdateError::Launch {
        path: path.clone(),
        source,
    })?;
    info!("launched {path} (pid {})", child.id());
    Ok(())
}

#[cfg(unix)]
fn detach(command: &mut Command) {
    use std::os::unix::process::CommandExt;

    command.process_group(0);
}

#[cfg(windows)]
fn detach(command: &mut Command) {
    use std::os::windows::process::CommandExt;

    command.creation_flags(DETACHED_PROCESS);
}

#[cfg(not(any(unix, windows)))]
fn detach(_command: &mut Command) {}
