use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use crate::platform::{IntrospectionError, ProcessIdentity, ProcessIntrospector};

/// Linux introspection straight from `/proc`.
///
/// The start time is field 22 of `/proc/<pid>/stat`, in clock ticks since
/// boot. Zombies count as gone: their `cwd` link is already released.
/// A directory removed under a live process reads back as
/// `"<path> (deleted)"` and is reported as
/// [`IntrospectionError::DirectoryRemoved`].
#[derive(Debug, Default)]
pub struct ProcfsIntrospector;

/// Fields of `/proc/<pid>/stat` that identify a process incarnation.
#[derive(Debug, PartialEq, Eq)]
struct StatFields {
    state: char,
    start_time: u64,
}

impl ProcfsIntrospector {
    pub fn new() -> Self {
        Self
    }

    fn read_stat(pid: u32) -> Result<StatFields, IntrospectionError> {
        let raw = fs::read_to_string(format!("/proc/{}/stat", pid))
            .map_err(|e| IntrospectionError::from_io(pid, e))?;
        let fields = parse_stat(&raw).ok_or_else(|| IntrospectionError::Io {
            pid,
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "malformed /proc stat line",
            ),
        })?;
        if matches!(fields.state, 'Z' | 'X') {
            return Err(IntrospectionError::NoSuchProcess { pid });
        }
        Ok(fields)
    }
}

impl ProcessIntrospector for ProcfsIntrospector {
    fn identify(&self, pid: u32) -> Result<ProcessIdentity, IntrospectionError> {
        let stat = Self::read_stat(pid)?;
        Ok(ProcessIdentity {
            pid,
            start_time: Some(stat.start_time),
        })
    }

    fn current_dir(&self, identity: &ProcessIdentity) -> Result<PathBuf, IntrospectionError> {
        let pid = identity.pid;
        let cwd = fs::read_link(format!("/proc/{}/cwd", pid))
            .map_err(|e| IntrospectionError::from_io(pid, e))?;

        // Checked after the readlink so a pid recycled in between is caught.
        let stat = Self::read_stat(pid)?;
        if !identity.matches(Some(stat.start_time)) {
            return Err(IntrospectionError::Reused { pid });
        }
        if is_removed(&cwd) {
            return Err(IntrospectionError::DirectoryRemoved { pid, path: cwd });
        }
        Ok(cwd)
    }
}

const DELETED_SUFFIX: &[u8] = b" (deleted)";

/// Whether a `/proc/<pid>/cwd` target names a directory that no longer
/// exists. A real directory whose name happens to end in the marker still
/// resolves.
fn is_removed(target: &Path) -> bool {
    target.as_os_str().as_bytes().ends_with(DELETED_SUFFIX) && !target.is_dir()
}

/// Parse the state and start time out of a `/proc/<pid>/stat` line.
///
/// The command name is wrapped in parentheses and may itself contain spaces
/// or `)`, so fields are counted from the last `)`.
fn parse_stat(raw: &str) -> Option<StatFields> {
    let rest = &raw[raw.rfind(')')? + 1..];
    let mut fields = rest.split_whitespace();
    let state = fields.next()?.chars().next()?;
    // `state` is field 3; `starttime` is field 22.
    let start_time = fields.nth(18)?.parse().ok()?;
    Some(StatFields { state, start_time })
}
