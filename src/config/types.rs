use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub watcher: WatcherConfig,
    #[serde(default)]
    pub terminal: TerminalConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Working-directory mirroring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Start a watcher for each launched child (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Delay between working-directory checks in milliseconds (default: 250).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Also `chdir` the host process into the child's directory (default: true).
    #[serde(default = "default_true")]
    pub apply_to_process: bool,
}

/// Handling of the host's controlling terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Put the host terminal into raw input mode while a child runs (default: true).
    #[serde(default = "default_true")]
    pub raw_input: bool,
    /// Re-query geometry on resize notifications where the platform has them (default: true).
    #[serde(default = "default_true")]
    pub track_resize: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `TERMHOST_LOG` is unset (default: "warn").
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Write logs here instead of stderr.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: default_poll_interval_ms(),
            apply_to_process: true,
        }
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            raw_input: true,
            track_resize: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            file: None,
        }
    }
}
