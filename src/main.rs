//! idler - run a command once whenever the desktop session goes idle.
//!
//! Validates the command, detaches from the terminal, then polls the idle
//! counter forever.

use std::env;
use std::ffi::OsString;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use idler::command::ResolvedCommand;
use idler::config::{Backend, Config, ConfigError, POLL_INTERVAL, Threshold};
use idler::launcher::ProcessLauncher;
use idler::{daemon, idle, trigger};

const PROG: &str = "idler";

/// Run a command once whenever the desktop session goes idle.
///
/// The command fires the first time the session has been idle longer than the
/// timeout, and not again until the user has touched the keyboard or mouse.
#[derive(Parser, Debug)]
#[command(name = "idler")]
#[command(author, version, about, long_about = None, disable_help_flag = true)]
struct Args {
    /// Print usage and exit.
    #[arg(short = 'h', long = "help")]
    usage: bool,

    /// Idle seconds before the command runs (0 to 4000000).
    #[arg(
        short = 't',
        long = "timeout",
        value_name = "SECONDS",
        default_value = "600",
        allow_negative_numbers = true
    )]
    threshold: Threshold,

    /// Stay attached to the terminal instead of daemonizing.
    #[arg(short, long)]
    foreground: bool,

    /// Idle time backend.
    #[arg(long, value_enum, default_value_t = Backend::X11)]
    backend: Backend,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Command to run, followed by its arguments.
    #[arg(value_name = "COMMAND", num_args = 1.., trailing_var_arg = true)]
    command: Vec<OsString>,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.kind() == ErrorKind::DisplayVersion => e.exit(),
        Err(e) => {
            eprintln!("{PROG}: {}", usage_error_line(&e));
            return ExitCode::FAILURE;
        }
    };

    if args.usage {
        eprintln!("{}", Args::command().render_usage());
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{PROG}: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// First line of a clap error, without its `error: ` tag.
fn usage_error_line(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}

fn run(args: Args) -> Result<()> {
    if args.command.is_empty() {
        return Err(ConfigError::MissingCommand.into());
    }

    let config = Config {
        threshold: args.threshold,
        poll_interval: POLL_INTERVAL,
        backend: args.backend,
        foreground: args.foreground,
    };

    // Resolve before anything else touches the working directory.
    let command = ResolvedCommand::prepare(args.command, env::var_os("PATH").as_deref())?;

    init_logging(&args.log_level)?;

    info!("{} v{} starting", PROG, env!("CARGO_PKG_VERSION"));
    info!(
        "Command: {} (threshold {}, backend {})",
        command.path.display(),
        config.threshold,
        config.backend
    );

    if !config.foreground {
        let idle = current_thread_runtime()?
            .block_on(idle::probe(config.backend))
            .context("failed to open idle source")?;
        debug!("Idle source probe: {:?}", idle);

        daemon::daemonize().context("failed to detach from terminal")?;
    }

    current_thread_runtime()?.block_on(run_daemon(config, command))
}

/// Initialize logging with the specified level.
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(format!("idler={level}"))
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Invalid log level")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    Ok(())
}

/// Single-threaded runtime; the trigger loop never runs tasks in parallel.
fn current_thread_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

/// Run the trigger loop until it fails or a termination signal arrives.
async fn run_daemon(config: Config, command: ResolvedCommand) -> Result<()> {
    let mut source = idle::open(config.backend)
        .await
        .context("failed to open idle source")?;
    let mut launcher = ProcessLauncher::new();
    let mut terminate =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;

    tokio::select! {
        result = trigger::run(source.as_mut(), &mut launcher, &command, &config) => {
            result?;
        }
        _ = terminate.recv() => info!("Received SIGTERM, shutting down"),
        _ = tokio::signal::ctrl_c() => info!("Received SIGINT, shutting down"),
    }

    Ok(())
}
