//! Credential management commands.

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use colored::Colorize;

use ghvis_core::{BearerToken, CredentialInfo, CredentialName, VisibilityRemote};
use ghvis_github::GithubClient;

use crate::commands::confirm;
use crate::context::App;
use crate::output;

#[derive(Args, Debug)]
pub struct ApiCommand {
    #[command(subcommand)]
    pub command: ApiSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ApiSubcommand {
    /// Validate a GitHub token and store it under a name
    Add(AddArgs),

    /// List stored credentials
    List(ListArgs),

    /// Make a stored credential the active one
    Load(NameArgs),

    /// Show the active credential
    Current,

    /// Delete a stored credential
    Remove(RemoveArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Name for the credential
    pub name: String,

    /// GitHub personal access token
    pub token: String,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct NameArgs {
    /// Credential name
    pub name: String,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Credential name
    pub name: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'f')]
    pub force: bool,
}

pub async fn handle(app: &App, cmd: ApiCommand) -> Result<()> {
    app.require_authorized().await?;

    match cmd.command {
        ApiSubcommand::Add(args) => add(app, args).await,
        ApiSubcommand::List(args) => list(app, args).await,
        ApiSubcommand::Load(args) => load(app, args).await,
        ApiSubcommand::Current => current(app).await,
        ApiSubcommand::Remove(args) => remove(app, args).await,
    }
}

async fn add(app: &App, args: AddArgs) -> Result<()> {
    let name = CredentialName::new(&args.name).context("Invalid credential name")?;
    let token = BearerToken::new(args.token.trim());

    if !token.looks_like_github_token() {
        output::warning("Token does not look like a GitHub token; validating anyway");
    }

    eprintln!("{}", "Validating GitHub token...".dimmed());

    let client = GithubClient::new(app.settings.api_base.clone(), &token)
        .context("Failed to create GitHub client")?;
    let login = match client.validate().await {
        Ok(login) => login,
        Err(e) => {
            app.audit("add_api", name.as_str(), false).await;
            return Err(e).context("Invalid GitHub token");
        }
    };

    app.vault
        .add_or_update(app.tenant, &name, &token, &login)
        .await
        .context("Failed to store credential")?;
    app.audit("add_api", name.as_str(), true).await;

    output::success(&format!("Credential '{}' added", name));
    output::field("GitHub user", &login);
    println!();
    output::hint(&format!("Use `ghvis api load {}` to activate it.", name));

    Ok(())
}

async fn list(app: &App, args: ListArgs) -> Result<()> {
    let credentials = app
        .vault
        .list(app.tenant)
        .await
        .context("Failed to list credentials")?;

    if args.json {
        return output::json_pretty(&credentials);
    }

    if credentials.is_empty() {
        println!("No credentials stored.");
        output::hint("Use `ghvis api add <name> <token>` to add one.");
        return Ok(());
    }

    output::heading("Your GitHub credentials:");
    for credential in &credentials {
        print_credential(credential);
    }

    Ok(())
}

fn print_credential(credential: &CredentialInfo) {
    let status = if credential.is_active {
        "active".green().bold()
    } else {
        "inactive".dimmed()
    };
    println!("• {} ({})", credential.name.to_string().bold(), status);
    println!("  user:  {}", credential.remote_principal);
    println!("  added: {}", credential.created_at.format("%Y-%m-%d"));
}

async fn load(app: &App, args: NameArgs) -> Result<()> {
    let name = CredentialName::new(&args.name).context("Invalid credential name")?;

    let credentials = app
        .vault
        .list(app.tenant)
        .await
        .context("Failed to list credentials")?;
    if !credentials.iter().any(|c| c.name == name) {
        let available: Vec<_> = credentials.iter().map(|c| c.name.to_string()).collect();
        bail!(
            "Credential '{}' not found. Available: {}",
            name,
            if available.is_empty() {
                "none".to_string()
            } else {
                available.join(", ")
            }
        );
    }

    let activated = app
        .vault
        .set_active(app.tenant, &name)
        .await
        .context("Failed to activate credential")?;
    if !activated {
        bail!("Credential '{}' was removed concurrently", name);
    }
    app.audit("load_api", name.as_str(), true).await;

    output::success(&format!("Credential '{}' is now active", name));
    if let Some(active) = credentials.iter().find(|c| c.name == name) {
        output::field("GitHub user", &active.remote_principal);
    }

    Ok(())
}

async fn current(app: &App) -> Result<()> {
    match app.active_credential().await? {
        Some(credential) => {
            output::heading("Active credential");
            output::field("Name", credential.name.as_str());
            output::field("GitHub user", &credential.remote_principal);
            output::field("Added", &credential.created_at.format("%Y-%m-%d").to_string());
        }
        None => {
            println!("No active credential.");
            output::hint("Use `ghvis api list` and `ghvis api load <name>`.");
        }
    }
    Ok(())
}

async fn remove(app: &App, args: RemoveArgs) -> Result<()> {
    let name = CredentialName::new(&args.name).context("Invalid credential name")?;

    let credentials = app
        .vault
        .list(app.tenant)
        .await
        .context("Failed to list credentials")?;
    let Some(existing) = credentials.iter().find(|c| c.name == name) else {
        bail!("Credential '{}' not found", name);
    };

    if !args.force {
        let prompt = format!(
            "Remove credential '{}' ({}{})? This cannot be undone.",
            name,
            existing.remote_principal,
            if existing.is_active { ", active" } else { "" }
        );
        if !confirm(&prompt)? {
            eprintln!("Aborted.");
            return Ok(());
        }
    }

    let removed = app
        .vault
        .remove(app.tenant, &name)
        .await
        .context("Failed to remove credential")?;
    app.audit("remove_api", name.as_str(), removed).await;

    if removed {
        output::success(&format!("Credential '{}' removed", name));
    } else {
        output::error(&format!("Credential '{}' was already gone", name));
    }

    Ok(())
}
