//! Single-repository commands.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Args, Subcommand};
use colored::Colorize;
use tracing::warn;

use ghvis_core::batch::parse_repository_list;
use ghvis_core::error::Error;
use ghvis_core::{RepoRef, RepoStatus, RepoStatusStore, RepositoryInfo, Visibility, VisibilityRemote};

use crate::context::App;
use crate::output;

const LIST_PREVIEW: usize = 15;

#[derive(Args, Debug)]
pub struct RepoCommand {
    #[command(subcommand)]
    pub command: RepoSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum RepoSubcommand {
    /// List repositories visible to the active credential
    List(ListArgs),

    /// Make a repository public
    Public(RepoArgs),

    /// Make a repository private
    Private(RepoArgs),

    /// Show repository details
    Status(RepoArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RepoArgs {
    /// Repository as `owner/name`, or `name` for the credential's own account
    pub repo: String,
}

pub async fn handle(app: &App, cmd: RepoCommand) -> Result<()> {
    app.require_authorized().await?;

    match cmd.command {
        RepoSubcommand::List(args) => list(app, args).await,
        RepoSubcommand::Public(args) => set_visibility(app, args, Visibility::Public).await,
        RepoSubcommand::Private(args) => set_visibility(app, args, Visibility::Private).await,
        RepoSubcommand::Status(args) => status(app, args).await,
    }
}

/// Resolve a single repository argument against the active login.
fn resolve(input: &str, login: &str) -> Result<RepoRef> {
    let mut repos = parse_repository_list(input, login).context("Invalid repository")?;
    match repos.len() {
        1 => Ok(repos.remove(0)),
        0 => bail!("No repository given"),
        _ => bail!("Expected one repository; use `ghvis batch` for several"),
    }
}

async fn set_visibility(app: &App, args: RepoArgs, target: Visibility) -> Result<()> {
    let (credential, client) = app.active_client().await?;
    let repo = resolve(&args.repo, &credential.remote_principal)?;
    let action = match target {
        Visibility::Private => "make_private",
        Visibility::Public => "make_public",
    };

    match client.set_visibility(&repo, target.is_private()).await {
        Ok(message) => {
            let cached = RepoStatus {
                repo: repo.clone(),
                visibility: target,
                last_modified: Utc::now(),
            };
            if let Err(e) = app.store.upsert_repo_status(app.tenant, cached).await {
                warn!(error = %e, repo = %repo, "failed to cache repository status");
            }
            app.audit(action, &repo.to_string(), true).await;

            output::success(&message);
        }
        Err(e) => {
            app.audit(action, &repo.to_string(), false).await;
            bail!("Failed to make {} {}: {}", repo, target, remote_reason(&e));
        }
    }

    Ok(())
}

async fn status(app: &App, args: RepoArgs) -> Result<()> {
    let (credential, client) = app.active_client().await?;
    let repo = resolve(&args.repo, &credential.remote_principal)?;

    let Some(info) = client
        .get_repository(&repo)
        .await
        .with_context(|| format!("Failed to fetch {}", repo))?
    else {
        bail!("Repository {} not found", repo);
    };
    let cached = app
        .store
        .get_repo_status(app.tenant, &repo)
        .await
        .context("Failed to read repository status cache")?;

    output::heading(&info.full_name);
    output::field("Visibility", &visibility_badge(info.visibility()));
    output::field(
        "Description",
        info.description.as_deref().unwrap_or("No description"),
    );
    output::field("Language", info.language.as_deref().unwrap_or("Unknown"));
    output::field("Size", &format!("{} MB", info.size_mb()));
    output::field("Created", output::date_part(&info.created_at));
    output::field("Updated", output::date_part(&info.updated_at));
    output::field("URL", &info.html_url);
    if let Some(cached) = cached {
        output::field(
            "Last changed here",
            &format!(
                "{} on {}",
                cached.visibility,
                cached.last_modified.format("%Y-%m-%d %H:%M")
            ),
        );
    }

    Ok(())
}

async fn list(app: &App, args: ListArgs) -> Result<()> {
    let (_, client) = app.active_client().await?;

    let repos = client
        .list_repositories()
        .await
        .context("Failed to list repositories")?;

    if args.json {
        return output::json_pretty(&repos);
    }

    if repos.is_empty() {
        println!("No repositories found.");
        return Ok(());
    }

    let (private, public): (Vec<&RepositoryInfo>, Vec<&RepositoryInfo>) =
        repos.iter().partition(|r| r.private);

    output::heading("Repository summary");
    output::field("Total", &repos.len().to_string());
    output::field("Public", &public.len().to_string());
    output::field("Private", &private.len().to_string());

    print_section("Public repositories", &public);
    print_section("Private repositories", &private);

    Ok(())
}

fn print_section(title: &str, repos: &[&RepositoryInfo]) {
    if repos.is_empty() {
        return;
    }

    println!();
    output::heading(&format!("{} ({})", title, repos.len()));
    for repo in repos.iter().take(LIST_PREVIEW) {
        let description = repo.description.as_deref().unwrap_or("No description");
        println!(
            "  • {} {}",
            repo.name.bold(),
            format!("({} MB)", repo.size_mb()).dimmed()
        );
        println!("    {}", output::truncate(description, 40).dimmed());
    }
    if repos.len() > LIST_PREVIEW {
        println!("  ... and {} more", repos.len() - LIST_PREVIEW);
    }
}

fn visibility_badge(visibility: Visibility) -> String {
    match visibility {
        Visibility::Private => "private".yellow().to_string(),
        Visibility::Public => "public".green().to_string(),
    }
}

/// The remote's own reason when there is one.
fn remote_reason(e: &Error) -> String {
    match e {
        Error::Remote(remote) => remote.message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_qualifies_bare_name() {
        let repo = resolve("hello", "octocat").unwrap();
        assert_eq!(repo.to_string(), "octocat/hello");

        let repo = resolve(" octo-org/tools ", "octocat").unwrap();
        assert_eq!(repo.to_string(), "octo-org/tools");
    }

    #[test]
    fn resolve_rejects_lists_and_blanks() {
        assert!(resolve("a,b", "octocat").is_err());
        assert!(resolve(" , ", "octocat").is_err());
    }
}
