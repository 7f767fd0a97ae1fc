//! Batch visibility command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::warn;

use ghvis_core::batch::{parse_repository_list, record_batch};
use ghvis_core::{BatchMode, BatchReport, BatchRequest};

use crate::commands::confirm;
use crate::context::App;
use crate::output;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Optional mode (`private`, `public` or `toggle`) followed by repositories.
    ///
    /// Repositories may be separated by commas or spaces. Without a mode each
    /// repository's visibility is flipped.
    #[arg(required = true, num_args = 1..)]
    pub args: Vec<String>,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Split the leading mode word, if any, from the repository arguments.
fn split_mode(args: &[String]) -> (BatchMode, &[String]) {
    match args.split_first() {
        Some((first, rest)) => match first.as_str() {
            "private" => (BatchMode::MakePrivate, rest),
            "public" => (BatchMode::MakePublic, rest),
            "toggle" => (BatchMode::AutoToggle, rest),
            _ => (BatchMode::AutoToggle, args),
        },
        None => (BatchMode::AutoToggle, args),
    }
}

pub async fn run(app: &App, args: BatchArgs) -> Result<()> {
    app.require_authorized().await?;

    let (credential, client) = app.active_client().await?;
    let (mode, rest) = split_mode(&args.args);
    let repositories = parse_repository_list(&rest.join(","), &credential.remote_principal)
        .context("Invalid repository list")?;

    let orchestrator = app.orchestrator();
    let request = BatchRequest::new(mode, repositories);
    let distinct = orchestrator.prepare(&request)?;

    if !args.yes {
        let names: Vec<String> = distinct.iter().map(ToString::to_string).collect();
        let prompt = format!(
            "{} {} repositories: {}?",
            describe(mode),
            distinct.len(),
            names.join(", ")
        );
        if !confirm(&prompt)? {
            eprintln!("Aborted.");
            return Ok(());
        }
    }

    eprintln!(
        "{}",
        format!("Processing {} repositories...", distinct.len()).dimmed()
    );

    let report = orchestrator.run(&client, &request).await?;

    if let Err(e) = record_batch(&app.store, app.tenant, &report).await {
        warn!(error = %e, "failed to record batch results");
    }

    if args.json {
        return output::json_pretty(&report);
    }

    print_report(&report);
    Ok(())
}

fn describe(mode: BatchMode) -> &'static str {
    match mode {
        BatchMode::MakePrivate => "Make private",
        BatchMode::MakePublic => "Make public",
        BatchMode::AutoToggle => "Toggle visibility of",
    }
}

fn print_report(report: &BatchReport) {
    output::heading(&format!("Batch {} results", report.mode));
    output::field(
        "Success",
        &format!("{}/{}", report.succeeded(), report.len()),
    );
    println!();

    for item in report.iter() {
        if item.outcome.success() {
            println!(
                "{} {} → {}",
                "✓".green(),
                item.repo,
                item.outcome.resulting_visibility_label()
            );
        } else {
            println!(
                "{} {} - {}",
                "✗".red(),
                item.repo,
                output::truncate(item.outcome.message(), 50)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(input: &[&str]) -> Vec<String> {
        input.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn leading_mode_word_is_consumed() {
        let args = words(&["private", "a", "b"]);
        let (mode, rest) = split_mode(&args);
        assert_eq!(mode, BatchMode::MakePrivate);
        assert_eq!(rest, &args[1..]);

        let args = words(&["toggle", "a"]);
        assert_eq!(split_mode(&args).0, BatchMode::AutoToggle);
    }

    #[test]
    fn no_mode_word_means_auto_toggle() {
        let args = words(&["octocat/a,octocat/b"]);
        let (mode, rest) = split_mode(&args);
        assert_eq!(mode, BatchMode::AutoToggle);
        assert_eq!(rest, &args[..]);
    }
}
