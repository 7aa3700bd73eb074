//! Shared test utilities.

#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use termhost::cwd::WatcherSettings;
use termhost::platform::{native_introspector, TerminalControl};
use termhost::supervisor::{Supervisor, SupervisorSettings};
use termhost::terminal::TerminalGeometry;

/// Stand-in for the host terminal that counts every call.
pub struct FakeTerminal {
    tty: bool,
    geometry: Option<TerminalGeometry>,
    size_queries: AtomicUsize,
    raw_switches: AtomicUsize,
    restores: AtomicUsize,
}

impl FakeTerminal {
    /// Host input is a pipe or file.
    pub fn detached() -> Arc<Self> {
        Arc::new(Self {
            tty: false,
            geometry: None,
            size_queries: AtomicUsize::new(0),
            raw_switches: AtomicUsize::new(0),
            restores: AtomicUsize::new(0),
        })
    }

    /// Host input is a terminal of the given size.
    pub fn interactive(columns: u16, rows: u16) -> Arc<Self> {
        Arc::new(Self {
            tty: true,
            geometry: TerminalGeometry::new(columns, rows),
            size_queries: AtomicUsize::new(0),
            raw_switches: AtomicUsize::new(0),
            restores: AtomicUsize::new(0),
        })
    }

    pub fn size_queries(&self) -> usize {
        self.size_queries.load(Ordering::SeqCst)
    }

    pub fn raw_switches(&self) -> usize {
        self.raw_switches.load(Ordering::SeqCst)
    }

    pub fn restores(&self) -> usize {
        self.restores.load(Ordering::SeqCst)
    }
}

impl TerminalControl for FakeTerminal {
    fn input_is_terminal(&self) -> bool {
        self.tty
    }

    fn enable_raw_input(&self) -> io::Result<()> {
        self.raw_switches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn restore_input(&self) -> io::Result<()> {
        self.restores.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn size(&self) -> io::Result<TerminalGeometry> {
        self.size_queries.fetch_add(1, Ordering::SeqCst);
        self.geometry
            .ok_or_else(|| io::Error::other("no terminal"))
    }
}

/// Settings that never touch the test process's own cwd or signal handlers.
pub fn settings(poll_interval: Duration) -> SupervisorSettings {
    SupervisorSettings {
        raw_input: true,
        track_resize: false,
        watch_cwd: true,
        watcher: WatcherSettings {
            poll_interval,
            apply_to_process: false,
        },
    }
}

pub fn supervisor(terminal: Arc<FakeTerminal>, settings: SupervisorSettings) -> Supervisor {
    Supervisor::with_platform(settings, terminal, native_introspector())
}

/// Poll `condition` every 10ms until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

/// Resolve symlinks (e.g. `/tmp` -> `/private/tmp` on macOS) so paths
/// reported by the OS compare equal.
pub fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().expect("path should exist")
}
