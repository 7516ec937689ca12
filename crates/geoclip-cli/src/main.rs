//! geoclip CLI
//!
//! Runs clip jobs against a directory-backed bucket and exposes the
//! standalone bounds calculator and config inspection.

mod cli;
mod commands;
mod config_loader;
mod envelope;
mod errors;
mod output;

use std::process::ExitCode;

use clap::Parser;
use cli::Cli;
use errors::CliError;

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match commands::execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            CliError::from_anyhow(&e).display();
            ExitCode::FAILURE
        }
    }
}
