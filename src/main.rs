//! CLI entry point for the URL importer.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

mod cli;
mod commands;
mod exit_handler;
mod progress_bar;
mod terminal;

use cli::{Args, AuthCommand, Command, ConfigCommand};

/// Process outcome mapped to the exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Every item succeeded (or there was nothing to do).
    Success,
    /// Some items failed.
    Partial,
    /// Nothing succeeded, the run was interrupted, or setup failed.
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Failure => ExitCode::from(1),
            ProcessExit::Partial => ExitCode::from(2),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(exit) => exit.into(),
        Err(error) => {
            eprintln!("Error: {error:#}");
            ProcessExit::Failure.into()
        }
    }
}

async fn run() -> Result<ProcessExit> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = terminal::default_log_level(args.quiet, args.verbose);
    let no_color = terminal::no_color_env_requested() || terminal::is_dumb_terminal();
    terminal::init_tracing(default_level, no_color);

    debug!(?args, "CLI arguments parsed");

    let loaded = commands::load_config(args.config.as_deref())?;

    match &args.command {
        Some(Command::Auth {
            command: AuthCommand::Login,
        }) => {
            commands::run_auth_login_command(&loaded.config).await?;
            Ok(ProcessExit::Success)
        }
        Some(Command::Auth {
            command: AuthCommand::Clear,
        }) => {
            commands::run_auth_clear_command(&loaded.config)?;
            Ok(ProcessExit::Success)
        }
        Some(Command::Config {
            command: ConfigCommand::Show,
        }) => {
            commands::run_config_show_command(&loaded)?;
            Ok(ProcessExit::Success)
        }
        None => {
            info!("URL importer starting");
            commands::run_import_command(loaded.config, &args.import, args.quiet).await
        }
    }
}
