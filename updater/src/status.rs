//! Status reporting between the update pipeline and the display shell.
//!
//! The pipeline only knows about [`StatusSink`]. The binary wires the sink
//! to a latest-value-wins slot ([`status_channel`]) that the main thread
//! drains with [`display_statuses`]. Intermediate messages may be skipped
//! if the display is slow, but the last message written before the sink
//! is dropped is always delivered.

use std::io::Write;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Receives human-readable progress text from the pipeline.
pub trait StatusSink: Send + Sync {
    /// Report the current status.
    fn report(&self, status: &str);
}

#[derive(Debug, Default)]
struct Slot {
    text: Option<String>,
    version: u64,
    closed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    slot: Mutex<Slot>,
    changed: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Producer side of the status slot.
///
/// Dropping the handle closes the slot; the receiver then drains the final
/// status and stops.
#[derive(Debug)]
pub struct StatusHandle {
    shared: Arc<Shared>,
}

/// Consumer side of the status slot.
#[derive(Debug)]
pub struct StatusReceiver {
    shared: Arc<Shared>,
    seen: u64,
}

/// Create a connected status handle and receiver.
///
/// # Examples
///
/// ```
/// use simple64_updater::status::{StatusSink, status_channel};
///
/// let (handle, mut receiver) = status_channel();
/// handle.report("Downloading latest release");
/// handle.report("Extracting ZIP archive");
/// drop(handle);
///
/// assert_eq!(receiver.next_status().as_deref(), Some("Extracting ZIP archive"));
/// assert_eq!(receiver.next_status(), None);
/// ```
#[must_use]
pub fn status_channel() -> (StatusHandle, StatusReceiver) {
    let shared = Arc::new(Shared::default());
    (
        StatusHandle {
            shared: Arc::clone(&shared),
        },
        StatusReceiver { shared, seen: 0 },
    )
}

impl StatusSink for StatusHandle {
    fn report(&self, status: &str) {
        let mut slot = self.shared.lock();
        slot.text = Some(status.to_owned());
        slot.version = slot.version.wrapping_add(1);
        drop(slot);
        self.shared.changed.notify_all();
    }
}

impl Drop for StatusHandle {
    fn drop(&mut self) {
        self.shared.lock().closed = true;
        self.shared.changed.notify_all();
    }
}

impl StatusReceiver {
    /// Block until a status newer than the last one returned is available.
    ///
    /// Returns `None` once the handle has been dropped and the final status
    /// has already been returned.
    pub fn next_status(&mut self) -> Option<String> {
        let mut slot = self.shared.lock();
        loop {
            if slot.version != self.seen {
                self.seen = slot.version;
                return slot.text.clone();
            }
            if slot.closed {
                return None;
            }
            slot = self
                .shared
                .changed
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Write each status to `out` until the pipeline closes its handle.
///
/// This is the textual display shell: it shows only the latest status and
/// returns the final one so the caller can log it.
pub fn display_statuses(receiver: &mut StatusReceiver, out: &mut dyn Write) -> Option<String> {
    let mut last = None;
    while let Some(status) = receiver.next_status() {
        if writeln!(out, "{status}").is_err() {
            // Best-effort display; the pipeline keeps running regardless.
        }
        last = Some(status);
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn receiver_sees_only_latest_value() {
        let (handle, mut receiver) = status_channel();
        handle.report("first");
        handle.report("second");
        assert_eq!(receiver.next_status().as_deref(), Some("second"));
        drop(handle);
        assert_eq!(receiver.next_status(), None);
    }

    #[test]
    fn final_status_is_delivered_after_close() {
        let (handle, mut receiver) = status_channel();
        let worker = thread::spawn(move || {
            for step in ["a", "b", "c"] {
                handle.report(step);
            }
        });
        worker.join().expect("worker panicked");

        let mut out = Vec::new();
        let last = display_statuses(&mut receiver, &mut out);
        assert_eq!(last.as_deref(), Some("c"));
        let text = String::from_utf8(out).expect("utf-8");
        assert!(text.ends_with("c\n"));
    }

    #[test]
    fn closed_without_reports_yields_nothing() {
        let (handle, mut receiver) = status_channel();
        drop(handle);
        assert_eq!(receiver.next_status(), None);
    }
}
