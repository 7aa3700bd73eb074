use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::cancel::CancellationToken;
use crate::cwd::WorkingDirectoryTracker;
use crate::platform::{IntrospectionError, ProcessIdentity, ProcessIntrospector};

/// How often the child's working directory is sampled by default.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherSettings {
    pub poll_interval: Duration,
    /// Also `chdir` the host into every directory observed.
    pub apply_to_process: bool,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            apply_to_process: true,
        }
    }
}

/// Coarse lifecycle of a watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Polling,
    Stopped,
}

/// Lifecycle of a watcher including why it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WatcherStatus {
    Polling = 0,
    /// The owner cancelled it.
    Cancelled = 1,
    /// The child exited, was reaped, became unreadable, or its pid was reused.
    ProcessGone = 2,
    /// The host could not `chdir` into the child's directory.
    ApplyFailed = 3,
}

impl WatcherStatus {
    pub fn state(self) -> WatcherState {
        match self {
            WatcherStatus::Polling => WatcherState::Polling,
            _ => WatcherState::Stopped,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => WatcherStatus::Polling,
            1 => WatcherStatus::Cancelled,
            2 => WatcherStatus::ProcessGone,
            _ => WatcherStatus::ApplyFailed,
        }
    }
}

/// Background poller that mirrors one child's working directory.
///
/// Failures never propagate: the watcher just stops and records why in
/// [`status`](Self::status). Dropping the handle cancels and joins the
/// thread, after which no further writes happen.
pub struct CwdWatcher {
    status: Arc<AtomicU8>,
    token: CancellationToken,
    thread: Option<thread::JoinHandle<()>>,
}

impl CwdWatcher {
    /// Start polling the process `identity` was taken from.
    ///
    /// The identity must be taken while the child is still unreaped, so a
    /// recycled pid can never be mistaken for it. Only fails if the OS
    /// refuses to create the thread.
    pub fn spawn(
        identity: ProcessIdentity,
        introspector: Arc<dyn ProcessIntrospector>,
        tracker: WorkingDirectoryTracker,
        settings: WatcherSettings,
    ) -> io::Result<Self> {
        let status = Arc::new(AtomicU8::new(WatcherStatus::Polling as u8));
        let token = CancellationToken::new();

        let thread = {
            let status = Arc::clone(&status);
            let token = token.clone();
            thread::Builder::new()
                .name(format!("termhost-cwd-{}", identity.pid))
                .spawn(move || {
                    let outcome =
                        poll_loop(identity, introspector.as_ref(), &tracker, settings, &token);
                    status.store(outcome as u8, Ordering::SeqCst);
                })?
        };

        Ok(Self {
            status,
            token,
            thread: Some(thread),
        })
    }

    /// A watcher for a process that could not be identified. It starts out
    /// stopped with [`WatcherStatus::ProcessGone`].
    pub fn unbound() -> Self {
        Self {
            status: Arc::new(AtomicU8::new(WatcherStatus::ProcessGone as u8)),
            token: CancellationToken::new(),
            thread: None,
        }
    }

    pub fn status(&self) -> WatcherStatus {
        WatcherStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    pub fn state(&self) -> WatcherState {
        self.status().state()
    }

    /// Ask the watcher to stop at its next wake-up. Does not block.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancel and wait for the thread to finish. Idempotent.
    pub fn stop(&mut self) -> WatcherStatus {
        self.token.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("cwd watcher thread panicked");
            }
        }
        self.status()
    }

    /// [`stop`](Self::stop), consuming the handle.
    pub fn join(mut self) -> WatcherStatus {
        self.stop()
    }
}

impl Drop for CwdWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn poll_loop(
    identity: ProcessIdentity,
    introspector: &dyn ProcessIntrospector,
    tracker: &WorkingDirectoryTracker,
    settings: WatcherSettings,
    token: &CancellationToken,
) -> WatcherStatus {
    let pid = identity.pid;
    loop {
        if token.wait_timeout(settings.poll_interval) {
            return WatcherStatus::Cancelled;
        }

        let dir = match introspector.current_dir(&identity) {
            Ok(dir) => dir,
            // Nothing real to mirror; the child may still move on.
            Err(IntrospectionError::DirectoryRemoved { path, .. }) => {
                tracing::trace!(pid, dir = %path.display(), "child directory was removed");
                continue;
            }
            Err(e) => {
                tracing::debug!(pid, "child working directory unavailable: {}", e);
                return WatcherStatus::ProcessGone;
            }
        };

        // A cancel that landed during the query wins over the write.
        if token.is_cancelled() {
            return WatcherStatus::Cancelled;
        }

        if tracker.record(dir.clone()) {
            tracing::trace!(pid, dir = %dir.display(), "child working directory changed");
        }

        if settings.apply_to_process {
            if let Err(e) = std::env::set_current_dir(&dir) {
                tracing::debug!(pid, dir = %dir.display(), "cannot follow child directory: {}", e);
                return WatcherStatus::ApplyFailed;
            }
        }
    }
}
