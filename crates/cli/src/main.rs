// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gantry: background job orchestrator CLI and daemon entry points.

mod commands;
mod pidfile;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use gantry_core::GroupKind;
use gantry_engine::Config;

use crate::pidfile::Pidfile;

#[derive(Parser)]
#[command(name = "gantry", version, about = "Background job orchestrator")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "/etc/gantry/gantry.toml")]
    config: PathBuf,

    /// Debug-level logging.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Write this process's pid here; removed on clean exit.
    #[arg(long, global = true)]
    pidfile: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Supervise the scheduler and performer daemons.
    Observer,
    /// Tick a performer at the configured interval.
    Scheduler {
        #[arg(long, value_enum)]
        mode: Mode,
    },
    /// Execute job groups when the scheduler signals.
    Performer {
        #[arg(long, value_enum)]
        mode: Mode,
    },
    /// Insert a job group.
    Enqueue(commands::enqueue::EnqueueArgs),
    /// Report or advance progress for the current job
    /// (requires GANTRY_JOB_ID, exported to action/rollback commands).
    Progress {
        #[command(subcommand)]
        action: commands::progress::ProgressAction,
    },
    /// Print the configured uniqkey.
    Uniqkey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Serial,
    Parallel,
}

impl From<Mode> for GroupKind {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Serial => GroupKind::Serial,
            Mode::Parallel => GroupKind::Parallel,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("gantry: {error:#}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(&cli.config)?;
    let _pidfile = cli.pidfile.as_deref().map(Pidfile::write).transpose()?;

    match cli.command {
        Command::Observer => commands::observer::run(config, &cli.config).await,
        Command::Scheduler { mode } => commands::scheduler::run(config, mode.into()).await,
        Command::Performer { mode } => commands::performer::run(config, mode.into()).await,
        Command::Enqueue(args) => commands::enqueue::run(config, args),
        Command::Progress { action } => commands::progress::run(config, action),
        Command::Uniqkey => {
            println!("{}", config.env.uniqkey);
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
