use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

/// Latest working directory observed for a child process.
///
/// The watcher is the only writer. Readers get a value at most one polling
/// interval old, never a torn one.
#[derive(Clone, Default)]
pub struct WorkingDirectoryTracker {
    inner: Arc<RwLock<TrackerState>>,
}

#[derive(Default)]
struct TrackerState {
    current: Option<PathBuf>,
    generation: u64,
}

impl WorkingDirectoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` until the first successful poll.
    pub fn current(&self) -> Option<PathBuf> {
        self.inner.read().current.clone()
    }

    /// Number of distinct directory changes recorded so far.
    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    /// Store `dir`, returning whether it differs from the previous value.
    pub(crate) fn record(&self, dir: PathBuf) -> bool {
        let mut state = self.inner.write();
        if state.current.as_ref() == Some(&dir) {
            return false;
        }
        state.current = Some(dir);
        state.generation += 1;
        true
    }
}
