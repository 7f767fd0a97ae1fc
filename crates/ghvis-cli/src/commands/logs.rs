//! Activity log command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use ghvis_core::{AuditEntry, AuditStore};

use crate::context::App;
use crate::output;

#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Number of entries to show
    #[arg(long, short = 'n', default_value_t = 20)]
    pub limit: usize,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(app: &App, args: LogsArgs) -> Result<()> {
    app.require_authorized().await?;

    let entries = app
        .store
        .query_audit_entries(app.tenant, args.limit)
        .await
        .context("Failed to read activity log")?;

    if args.json {
        return output::json_pretty(&entries);
    }

    if entries.is_empty() {
        println!("No activity yet.");
        return Ok(());
    }

    let succeeded = entries.iter().filter(|e| e.status.is_success()).count();
    output::heading(&format!("Recent activity ({})", entries.len()));
    output::field(
        "Summary",
        &format!(
            "{} succeeded, {} failed",
            succeeded,
            entries.len() - succeeded
        ),
    );
    println!();

    for entry in &entries {
        print_entry(entry);
    }

    Ok(())
}

fn print_entry(entry: &AuditEntry) {
    let icon = if entry.status.is_success() {
        "✓".green()
    } else {
        "✗".red()
    };
    println!(
        "{} {} {} {}",
        icon,
        title_case(&entry.action).bold(),
        entry.target,
        entry.timestamp.format("%m/%d %H:%M").to_string().dimmed()
    );
}

/// `make_private` → `Make Private`.
fn title_case(action: &str) -> String {
    action
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
