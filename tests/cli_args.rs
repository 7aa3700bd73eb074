//! Tests for the `termhost` binary.
//!
//! Every run gets an empty config file so the user's own config never leaks
//! in, and stdin is never a terminal so raw mode is not touched.

#![cfg(unix)]

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

struct Host {
    _dir: TempDir,
    config: std::path::PathBuf,
}

impl Host {
    fn new(config_body: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = dir.path().join("config.toml");
        std::fs::write(&config, config_body).expect("Failed to write config");
        Self { _dir: dir, config }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_termhost"));
        cmd.arg("--config")
            .arg(&self.config)
            .env("TERMHOST_LOG", "off")
            .stdin(Stdio::null());
        cmd
    }
}

#[test]
fn help_lists_host_options() {
    let output = Command::new(env!("CARGO_BIN_EXE_termhost"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("--poll-interval-ms"));
    assert!(stdout.contains("--no-cwd-mirror"));
    assert!(stdout.contains("--title"));
}

#[test]
fn relays_child_output() {
    let host = Host::new("");
    let output = host
        .cmd()
        .args(["echo", "hello"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hello\n");
}

#[test]
fn relays_child_stderr_separately() {
    let host = Host::new("");
    let output = host
        .cmd()
        .args(["sh", "-c", "echo to-err >&2"])
        .output()
        .expect("Failed to execute command");

    assert!(output.stdout.is_empty());
    assert_eq!(String::from_utf8_lossy(&output.stderr), "to-err\n");
}

#[test]
fn relays_stdin_to_child() {
    let host = Host::new("");
    let mut child = host
        .cmd()
        .arg("cat")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to spawn");

    {
        let mut stdin = child.stdin.take().unwrap();
        stdin.write_all(b"through the pipe\n").unwrap();
    }
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "through the pipe\n");
}

#[test]
fn propagates_child_exit_code() {
    let host = Host::new("");
    let output = host
        .cmd()
        .args(["sh", "-c", "exit 3"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn child_flags_are_not_parsed_by_host() {
    let host = Host::new("");
    let output = host
        .cmd()
        .args(["printf", "%s\\n", "--help", "--config", "-t", "x"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "--help\n--config\n-t\nx\n"
    );
}

#[test]
fn title_is_written_before_output() {
    let host = Host::new("");
    let output = host
        .cmd()
        .args(["-t", "build", "echo", "done"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert_eq!(output.stdout, b"\x1b]0;build\x07done\n");
}

#[test]
fn missing_executable_exits_with_error() {
    let host = Host::new("");
    let output = host
        .cmd()
        .arg("termhost-no-such-program-xyz")
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Error: Executable 'termhost-no-such-program-xyz' not found"),
        "unexpected stderr: {}",
        stderr
    );
}

#[test]
fn invalid_config_exits_with_error() {
    let host = Host::new("[watcher]\npoll_interval_ms = 0\n");
    let output = host
        .cmd()
        .args(["echo", "never"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Config validation failed"));
}

#[test]
fn interval_flag_is_validated() {
    let host = Host::new("");
    let output = host
        .cmd()
        .args(["--poll-interval-ms", "0", "echo", "never"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn missing_program_is_usage_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_termhost"))
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("PROGRAM"));
}
