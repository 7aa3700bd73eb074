//! Host an interactive program behind stdio pipes.
//!
//! The [`supervisor`] launches the child and wires its pipes, the [`cwd`]
//! watcher mirrors the child's working directory back into the host, and the
//! [`terminal`] adapter keeps track of the controlling terminal's geometry.
//! Everything OS-specific lives behind the traits in [`platform`].

pub mod cancel;
pub mod config;
pub mod cwd;
pub mod logging;
pub mod platform;
pub mod supervisor;
pub mod terminal;
