//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::admin::AdminCommand;
use crate::commands::api::ApiCommand;
use crate::commands::batch::BatchArgs;
use crate::commands::logs::LogsArgs;
use crate::commands::repo::RepoCommand;

/// Manage GitHub credentials and repository visibility.
#[derive(Parser, Debug)]
#[command(name = "ghvis")]
#[command(author, version = env!("GHVIS_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Acting user id (defaults to GHVIS_USER)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Data directory (defaults to GHVIS_DATA_DIR or the platform data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// GitHub API base URL (defaults to GHVIS_API_BASE or https://api.github.com)
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register yourself and show your status
    Start,

    /// Manage stored GitHub credentials
    Api(ApiCommand),

    /// Inspect and change repositories with the active credential
    Repo(RepoCommand),

    /// Change the visibility of several repositories at once
    Batch(BatchArgs),

    /// Show your recent activity
    Logs(LogsArgs),

    /// Administrator commands
    Admin(AdminCommand),
}
