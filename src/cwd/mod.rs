//! Mirroring a child's working directory into the host.

mod tracker;
mod watcher;

pub use tracker::WorkingDirectoryTracker;
pub use watcher::{CwdWatcher, WatcherSettings, WatcherState, WatcherStatus, DEFAULT_POLL_INTERVAL};
