#![deny(unsafe_code)]

mod commands;
mod config;
mod exit_code;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use browserpad_core::{ErrorCategory, VaultError};
use browserpad_server::ServerError;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::{check_path, serve};

/// Browser-based file editor backend
#[derive(Parser)]
#[command(name = "browserpad")]
#[command(author, version)]
#[command(propagate_version = true)]
#[command(after_help = "EXAMPLES:
    # Serve the current directory on http://127.0.0.1:8080
    browserpad serve

    # Serve a directory with soft-delete enabled
    browserpad serve /srv/files --init-trash

    # Use settings from a specific config file
    BROWSERPAD_CONFIG=./browserpad.toml browserpad serve

    # See where a client path would land
    browserpad check-path /srv/files /docs/readme.md")]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress log output and error messages
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the file API server
    Serve(serve::Args),

    /// Resolve a client path against a root
    CheckPath(check_path::Args),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let quiet = cli.quiet;

    match run(cli) {
        Ok(()) => ExitCode::from(exit_code::SUCCESS),
        Err(e) => {
            let code = categorize_error(&e);
            if !quiet {
                eprintln!("Error: {e:#}");
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if !cli.quiet {
        setup_tracing(cli.verbose);
    }

    match cli.command {
        Commands::Serve(args) => serve::execute(&args),
        Commands::CheckPath(args) => check_path::execute(&args),
    }
}

/// Set up tracing/logging based on verbosity level
fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();
}

/// Categorize an error into an exit code using typed error downcasting
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(vault_err) = cause.downcast_ref::<VaultError>() {
            return match vault_err {
                VaultError::Io { source, .. } if source.kind() == io::ErrorKind::PermissionDenied => {
                    exit_code::PERMISSION_DENIED
                }
                _ if vault_err.category() == ErrorCategory::NotFound => exit_code::NOT_FOUND,
                _ => exit_code::GENERAL_ERROR,
            };
        }

        if let Some(ServerError::Bind { .. }) = cause.downcast_ref::<ServerError>() {
            return exit_code::BIND_FAILED;
        }

        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::PermissionDenied => return exit_code::PERMISSION_DENIED,
                io::ErrorKind::NotFound => return exit_code::NOT_FOUND,
                io::ErrorKind::Interrupted => return exit_code::CANCELLED,
                _ => {}
            }
        }
    }

    exit_code::GENERAL_ERROR
}
