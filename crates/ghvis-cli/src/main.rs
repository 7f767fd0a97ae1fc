//! ghvis - manage GitHub credentials and repository visibility.
//!
//! Stores named GitHub tokens encrypted at rest, one active per user, and
//! changes repository visibility one at a time or in bounded batches.

mod cli;
mod commands;
mod config;
mod context;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::Cli;
use config::Settings;
use context::App;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let settings = Settings::from_env()
        .context("Invalid configuration")?
        .with_overrides(cli.data_dir.clone(), cli.api_base.as_deref())
        .context("Invalid command-line override")?;

    let app = App::new(settings, cli.user.as_deref())?;
    commands::handle(&app, cli.command).await
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // stdout carries command output
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
