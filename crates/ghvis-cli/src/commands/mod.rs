//! Subcommand implementations.

pub mod admin;
pub mod api;
pub mod batch;
pub mod logs;
pub mod repo;
mod start;

use std::io::{self, Write};

use anyhow::Result;

use crate::cli::Commands;
use crate::context::App;

pub async fn handle(app: &App, command: Commands) -> Result<()> {
    match command {
        Commands::Start => start::run(app).await,
        Commands::Api(cmd) => api::handle(app, cmd).await,
        Commands::Repo(cmd) => repo::handle(app, cmd).await,
        Commands::Batch(args) => batch::run(app, args).await,
        Commands::Logs(args) => logs::run(app, args).await,
        Commands::Admin(cmd) => admin::handle(app, cmd).await,
    }
}

/// Ask a yes/no question on stderr. Anything but `y` is no.
pub(crate) fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{} [y/N] ", prompt);
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case("y"))
}
