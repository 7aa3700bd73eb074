use std::io;
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, ExitStatus};

use crate::cwd::{CwdWatcher, WatcherState, WatcherStatus, WorkingDirectoryTracker};
use crate::terminal::{GeometryAdapter, ResizeWatcher, TerminalGeometry};

/// The three raw byte streams of a child. No framing, no buffering layer.
pub struct ChildPipes {
    pub stdin: ChildStdin,
    pub stdout: ChildStdout,
    pub stderr: ChildStderr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildState {
    Running,
    Exited(ExitStatus),
}

/// A launched child and the background helpers bound to it.
///
/// Once [`wait`](Self::wait) or [`try_wait`](Self::try_wait) has seen the
/// child exit, or the handle is dropped, the cwd watcher is cancelled and
/// joined and the resize listener is stopped. Dropping does not kill the
/// child.
pub struct ChildProcess {
    child: Child,
    pipes: Option<ChildPipes>,
    exit: Option<ExitStatus>,
    geometry: GeometryAdapter,
    tracker: WorkingDirectoryTracker,
    watcher: Option<CwdWatcher>,
    resize: Option<ResizeWatcher>,
    raw_input: bool,
}

impl ChildProcess {
    pub(crate) fn new(
        child: Child,
        pipes: ChildPipes,
        geometry: GeometryAdapter,
        tracker: WorkingDirectoryTracker,
        watcher: Option<CwdWatcher>,
        resize: Option<ResizeWatcher>,
        raw_input: bool,
    ) -> Self {
        Self {
            child,
            pipes: Some(pipes),
            exit: None,
            geometry,
            tracker,
            watcher,
            resize,
            raw_input,
        }
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Hand the pipes to the relay layer. `None` after the first call.
    pub fn take_pipes(&mut self) -> Option<ChildPipes> {
        self.pipes.take()
    }

    pub fn state(&self) -> ChildState {
        match self.exit {
            Some(status) => ChildState::Exited(status),
            None => ChildState::Running,
        }
    }

    /// Non-blocking exit check.
    pub fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        if let Some(status) = self.exit {
            return Ok(Some(status));
        }
        let status = self.child.try_wait()?;
        if let Some(status) = status {
            self.mark_exited(status);
        }
        Ok(status)
    }

    /// Block until the child exits.
    ///
    /// Pipes that were never taken are closed first, so a child blocked on
    /// reading stdin or on a full output pipe can finish.
    pub fn wait(&mut self) -> io::Result<ExitStatus> {
        if let Some(status) = self.exit {
            return Ok(status);
        }
        drop(self.pipes.take());
        let status = self.child.wait()?;
        self.mark_exited(status);
        Ok(status)
    }

    pub fn kill(&mut self) -> io::Result<()> {
        if self.exit.is_some() {
            return Ok(());
        }
        self.child.kill()
    }

    /// Geometry captured at launch or on the latest resize, if the host
    /// input is a terminal.
    pub fn geometry(&self) -> Option<TerminalGeometry> {
        self.geometry.last()
    }

    /// Live view of the child's working directory.
    pub fn cwd_tracker(&self) -> WorkingDirectoryTracker {
        self.tracker.clone()
    }

    /// `None` when watching was disabled for this launch.
    pub fn watcher_status(&self) -> Option<WatcherStatus> {
        self.watcher.as_ref().map(CwdWatcher::status)
    }

    pub fn watcher_state(&self) -> Option<WatcherState> {
        self.watcher.as_ref().map(CwdWatcher::state)
    }

    /// Whether this launch switched the host terminal to raw input, in which
    /// case the caller restores it when the session ends.
    pub fn raw_input_enabled(&self) -> bool {
        self.raw_input
    }

    fn mark_exited(&mut self, status: ExitStatus) {
        tracing::debug!(pid = self.child.id(), %status, "child exited");
        self.exit = Some(status);
        self.release_background();
    }

    fn release_background(&mut self) {
        if let Some(watcher) = self.watcher.as_mut() {
            watcher.stop();
        }
        if let Some(resize) = self.resize.take() {
            resize.stop();
        }
    }
}

impl Drop for ChildProcess {
    fn drop(&mut self) {
        self.release_background();
    }
}
