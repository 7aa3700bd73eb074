use std::path::PathBuf;

use parking_lot::Mutex;
use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System, UpdateKind};

use crate::platform::{IntrospectionError, ProcessIdentity, ProcessIntrospector};

/// Portable introspection through `sysinfo`, used where `/proc` is absent.
///
/// `start_time` is seconds since the epoch, which is coarse but enough to
/// tell a recycled pid from the original within one polling interval.
pub struct SysinfoIntrospector {
    system: Mutex<System>,
}

impl SysinfoIntrospector {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    /// Refresh `pid` and return `(cwd, start_time)`.
    fn probe(&self, pid: u32) -> Result<(Option<PathBuf>, u64), IntrospectionError> {
        let sys_pid = Pid::from_u32(pid);
        let mut system = self.system.lock();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[sys_pid]),
            true,
            ProcessRefreshKind::new().with_cwd(UpdateKind::Always),
        );

        let process = system
            .process(sys_pid)
            .ok_or(IntrospectionError::NoSuchProcess { pid })?;
        if matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead) {
            return Err(IntrospectionError::NoSuchProcess { pid });
        }
        Ok((process.cwd().map(|p| p.to_path_buf()), process.start_time()))
    }
}

impl Default for SysinfoIntrospector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessIntrospector for SysinfoIntrospector {
    fn identify(&self, pid: u32) -> Result<ProcessIdentity, IntrospectionError> {
        let (_, start_time) = self.probe(pid)?;
        Ok(ProcessIdentity {
            pid,
            start_time: Some(start_time),
        })
    }

    fn current_dir(&self, identity: &ProcessIdentity) -> Result<PathBuf, IntrospectionError> {
        let pid = identity.pid;
        let (cwd, start_time) = self.probe(pid)?;
        if !identity.matches(Some(start_time)) {
            return Err(IntrospectionError::Reused { pid });
        }
        // sysinfo reports an unreadable cwd as absent.
        cwd.ok_or(IntrospectionError::AccessDenied { pid })
    }
}
