//! Meridian CLI
//!
//! Command-line front end for the meridian-geo engine.

mod cli;
mod commands;
mod config_loader;
mod errors;
mod geometry_io;
mod output;
mod output_types;

use clap::Parser;
use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    match commands::execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            errors::from_anyhow(e).display();
            ExitCode::FAILURE
        }
    }
}
