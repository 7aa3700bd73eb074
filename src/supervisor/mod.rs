//! Launching a child behind pipes and wiring its helpers.

mod child;
mod command;
mod error;

use std::ffi::OsStr;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::cwd::{CwdWatcher, WatcherSettings, WorkingDirectoryTracker};
use crate::platform::{native_introspector, native_terminal, ProcessIntrospector, TerminalControl};
use crate::terminal::{GeometryAdapter, ResizeWatcher};

pub use child::{ChildPipes, ChildProcess, ChildState};
pub use command::LaunchSpec;
pub use error::LaunchError;

/// Which helpers a launch sets up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorSettings {
    /// Switch an interactive host terminal to raw input after spawning.
    pub raw_input: bool,
    /// Listen for resize notifications on an interactive host terminal.
    pub track_resize: bool,
    /// Start a working-directory watcher for each child.
    pub watch_cwd: bool,
    pub watcher: WatcherSettings,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            raw_input: true,
            track_resize: true,
            watch_cwd: true,
            watcher: WatcherSettings::default(),
        }
    }
}

impl From<&Config> for SupervisorSettings {
    fn from(config: &Config) -> Self {
        Self {
            raw_input: config.terminal.raw_input,
            track_resize: config.terminal.track_resize,
            watch_cwd: config.watcher.enabled,
            watcher: WatcherSettings {
                poll_interval: Duration::from_millis(config.watcher.poll_interval_ms),
                apply_to_process: config.watcher.apply_to_process,
            },
        }
    }
}

/// Launches children and binds the terminal and cwd helpers to them.
pub struct Supervisor {
    terminal: Arc<dyn TerminalControl>,
    introspector: Arc<dyn ProcessIntrospector>,
    settings: SupervisorSettings,
}

impl Supervisor {
    /// Supervisor backed by the build target's platform primitives.
    pub fn new(settings: SupervisorSettings) -> Self {
        Self::with_platform(settings, native_terminal(), native_introspector())
    }

    pub fn with_platform(
        settings: SupervisorSettings,
        terminal: Arc<dyn TerminalControl>,
        introspector: Arc<dyn ProcessIntrospector>,
    ) -> Self {
        Self {
            terminal,
            introspector,
            settings,
        }
    }

    pub fn settings(&self) -> &SupervisorSettings {
        &self.settings
    }

    /// The host terminal, for restoring its input mode after a session.
    pub fn terminal(&self) -> Arc<dyn TerminalControl> {
        Arc::clone(&self.terminal)
    }

    /// Launch `program` with a discrete argument list.
    pub fn launch<I, S>(&self, program: impl AsRef<OsStr>, args: I) -> Result<ChildProcess, LaunchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.launch_with(&LaunchSpec::new(program).args(args))
    }

    /// Launch a child with stdin, stdout and stderr each on its own pipe.
    ///
    /// Only the spawn itself can fail. After it succeeds, raw input mode,
    /// the geometry query, the resize listener and the cwd watcher are all
    /// best effort and are skipped with a debug log if unavailable. None of
    /// them run when the spawn fails.
    pub fn launch_with(&self, spec: &LaunchSpec) -> Result<ChildProcess, LaunchError> {
        let program = spec.program().to_string_lossy().into_owned();
        if spec.program().is_empty() {
            return Err(LaunchError::InvalidInput {
                program,
                reason: "program name is empty".to_string(),
            });
        }

        let mut command = Command::new(spec.program());
        command
            .args(spec.get_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in spec.get_env() {
            command.env(key, value);
        }
        if let Some(dir) = spec.get_current_dir() {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .map_err(|e| LaunchError::from_spawn(program.clone(), e))?;
        let pid = child.id();

        let pipes = match (child.stdin.take(), child.stdout.take(), child.stderr.take()) {
            (Some(stdin), Some(stdout), Some(stderr)) => ChildPipes {
                stdin,
                stdout,
                stderr,
            },
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(LaunchError::Spawn {
                    program,
                    source: std::io::Error::other("child pipes were not created"),
                });
            }
        };
        tracing::info!(pid, program = %program, "child launched");

        let interactive = self.terminal.input_is_terminal();

        let mut raw_input = false;
        if interactive && self.settings.raw_input {
            match self.terminal.enable_raw_input() {
                Ok(()) => raw_input = true,
                Err(e) => tracing::debug!("raw input mode unavailable: {}", e),
            }
        }

        let geometry = GeometryAdapter::new(Arc::clone(&self.terminal));
        let mut resize = None;
        if interactive {
            geometry.sync();
            if self.settings.track_resize {
                match ResizeWatcher::start(geometry.clone()) {
                    Ok(watcher) => resize = watcher,
                    Err(e) => tracing::debug!("resize notifications unavailable: {}", e),
                }
            }
        }

        let tracker = WorkingDirectoryTracker::new();
        let watcher = if self.settings.watch_cwd {
            self.watch(pid, &tracker)
        } else {
            None
        };

        Ok(ChildProcess::new(
            child, pipes, geometry, tracker, watcher, resize, raw_input,
        ))
    }

    /// Bind a watcher to `pid` while the child is still unreaped, so the
    /// pid cannot have been handed to another process yet.
    fn watch(&self, pid: u32, tracker: &WorkingDirectoryTracker) -> Option<CwdWatcher> {
        let identity = match self.introspector.identify(pid) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::debug!(pid, "cwd watcher could not bind: {}", e);
                return Some(CwdWatcher::unbound());
            }
        };
        match CwdWatcher::spawn(
            identity,
            Arc::clone(&self.introspector),
            tracker.clone(),
            self.settings.watcher,
        ) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(pid, "could not start cwd watcher: {}", e);
                None
            }
        }
    }
}
