use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitStatus;
use std::thread;

use anyhow::Context;
use clap::Parser;
use termhost::config::Config;
use termhost::logging;
use termhost::supervisor::{ChildPipes, LaunchSpec, Supervisor, SupervisorSettings};

#[derive(Parser, Debug)]
#[command(
    name = "termhost",
    version,
    about = "Run a program behind pipes while following its working directory"
)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Set the terminal window title before launching
    #[arg(short, long)]
    title: Option<String>,

    /// How often to check the child's working directory, in milliseconds
    #[arg(long, value_name = "MS")]
    poll_interval_ms: Option<u64>,

    /// Do not follow the child's working directory
    #[arg(long)]
    no_cwd_mirror: bool,

    /// Program to run, followed by its arguments
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "PROGRAM"
    )]
    command: Vec<OsString>,
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = load_config(&cli)?;
    logging::init_tracing(&config.logging).context("failed to initialise logging")?;

    if let Some(title) = &cli.title {
        set_title(title).context("failed to set terminal title")?;
    }

    let spec = LaunchSpec::from_argv(&cli.command).context("no program given")?;
    let supervisor = Supervisor::new(SupervisorSettings::from(&config));
    let mut child = supervisor.launch_with(&spec)?;

    let terminal = supervisor.terminal();
    let raw_input = child.raw_input_enabled();
    let _restore = scopeguard::guard((), move |_| {
        if raw_input {
            let _ = terminal.restore_input();
        }
    });

    let pipes = child.take_pipes().context("child pipes already taken")?;
    let relay = Relay::start(pipes)?;
    let status = child.wait()?;
    relay.finish();

    Ok(exit_code(status))
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(ms) = cli.poll_interval_ms {
        config.watcher.poll_interval_ms = ms;
    }
    if cli.no_cwd_mirror {
        config.watcher.enabled = false;
    }
    config.validate()?;
    Ok(config)
}

fn set_title(title: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "\x1b]0;{}\x07", title)?;
    stdout.flush()
}

/// Byte pumps between the host's stdio and the child's pipes.
///
/// Every chunk is written through and flushed as soon as it is read.
struct Relay {
    stdout: thread::JoinHandle<()>,
    stderr: thread::JoinHandle<()>,
}

impl Relay {
    fn start(pipes: ChildPipes) -> io::Result<Self> {
        let ChildPipes {
            stdin,
            stdout,
            stderr,
        } = pipes;

        // Blocks on the host's stdin until EOF; never joined.
        thread::Builder::new()
            .name("termhost-stdin".to_string())
            .spawn(move || {
                if let Err(e) = forward(io::stdin(), stdin) {
                    tracing::debug!("stdin relay stopped: {}", e);
                }
            })?;

        let stdout = thread::Builder::new()
            .name("termhost-stdout".to_string())
            .spawn(move || {
                if let Err(e) = forward(stdout, io::stdout()) {
                    tracing::debug!("stdout relay stopped: {}", e);
                }
            })?;

        let stderr = thread::Builder::new()
            .name("termhost-stderr".to_string())
            .spawn(move || {
                if let Err(e) = forward(stderr, io::stderr()) {
                    tracing::debug!("stderr relay stopped: {}", e);
                }
            })?;

        Ok(Self { stdout, stderr })
    }

    /// Wait for the child's output streams to drain.
    fn finish(self) {
        let _ = self.stdout.join();
        let _ = self.stderr.join();
    }
}

fn forward(mut reader: impl Read, mut writer: impl Write) -> io::Result<()> {
    let mut buffer = [0u8; 8192];
    loop {
        let count = match reader.read(&mut buffer) {
            Ok(0) => return Ok(()),
            Ok(count) => count,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buffer[..count])?;
        writer.flush()?;
    }
}

/// Shell convention: the child's own code, or 128 + signal number.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
