//! OS capabilities used by the supervisor, behind two small traits.
//!
//! [`TerminalControl`] covers the host's own terminal (is stdin a tty, raw
//! input mode, geometry). [`ProcessIntrospector`] looks at another process's
//! live working directory. Each has one implementation per target; the rest
//! of the crate only sees the traits.

#[cfg(target_os = "linux")]
mod procfs;
mod sysinfo_probe;
#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::terminal::TerminalGeometry;

#[cfg(target_os = "linux")]
pub use procfs::ProcfsIntrospector;
pub use sysinfo_probe::SysinfoIntrospector;
#[cfg(unix)]
pub use unix::UnixTerminal;
#[cfg(windows)]
pub use windows::WindowsTerminal;

/// The host process's controlling terminal.
pub trait TerminalControl: Send + Sync {
    /// Whether the host's standard input is attached to an interactive terminal.
    fn input_is_terminal(&self) -> bool;

    /// Disable line editing and input translation on the host terminal.
    fn enable_raw_input(&self) -> io::Result<()>;

    /// Undo [`enable_raw_input`](Self::enable_raw_input).
    fn restore_input(&self) -> io::Result<()>;

    /// Current visible columns and rows.
    fn size(&self) -> io::Result<TerminalGeometry>;
}

/// Why a process's working directory could not be observed.
#[derive(Debug, Error)]
pub enum IntrospectionError {
    #[error("process {pid} does not exist")]
    NoSuchProcess { pid: u32 },

    #[error("access denied inspecting process {pid}")]
    AccessDenied { pid: u32 },

    #[error("process id {pid} now belongs to a different process")]
    Reused { pid: u32 },

    /// The process is alive but its working directory has been removed.
    #[error("working directory of process {pid} was removed: {}", .path.display())]
    DirectoryRemoved { pid: u32, path: PathBuf },

    #[error("failed to inspect process {pid}: {source}")]
    Io {
        pid: u32,
        #[source]
        source: io::Error,
    },
}

impl IntrospectionError {
    pub fn from_io(pid: u32, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::NoSuchProcess { pid },
            io::ErrorKind::PermissionDenied => Self::AccessDenied { pid },
            _ => Self::Io { pid, source },
        }
    }
}

/// A pid pinned to one incarnation of a process.
///
/// `start_time` is whatever monotonic start marker the platform reports. Two
/// identities with the same pid but different start times are different
/// processes. `None` means the platform could not say, and only the pid is
/// compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessIdentity {
    pub pid: u32,
    pub start_time: Option<u64>,
}

impl ProcessIdentity {
    /// Whether `observed` (a fresh start-time reading for the same pid) still
    /// describes this process.
    pub fn matches(&self, observed: Option<u64>) -> bool {
        match (self.start_time, observed) {
            (Some(expected), Some(actual)) => expected == actual,
            _ => true,
        }
    }
}

/// Reads another process's live working directory.
pub trait ProcessIntrospector: Send + Sync {
    /// Pin `pid` to its current incarnation.
    fn identify(&self, pid: u32) -> Result<ProcessIdentity, IntrospectionError>;

    /// Current working directory of `identity`.
    ///
    /// Fails with [`IntrospectionError::Reused`] once the pid has been taken
    /// by another process, and with [`IntrospectionError::DirectoryRemoved`]
    /// while the process sits in a deleted directory.
    fn current_dir(&self, identity: &ProcessIdentity) -> Result<PathBuf, IntrospectionError>;
}

/// Terminal backend for the build target.
pub fn native_terminal() -> Arc<dyn TerminalControl> {
    #[cfg(unix)]
    {
        Arc::new(UnixTerminal::new())
    }
    #[cfg(windows)]
    {
        Arc::new(WindowsTerminal::new())
    }
}

/// Introspection backend for the build target.
pub fn native_introspector() -> Arc<dyn ProcessIntrospector> {
    #[cfg(target_os = "linux")]
    {
        Arc::new(ProcfsIntrospector::new())
    }
    #[cfg(not(target_os = "linux"))]
    {
        Arc::new(SysinfoIntrospector::new())
    }
}
