//! Administrator commands.

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};

use ghvis_core::{TenantId, UserStore};

use crate::context::App;
use crate::output;

#[derive(Args, Debug)]
pub struct AdminCommand {
    #[command(subcommand)]
    pub command: AdminSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum AdminSubcommand {
    /// Allow a registered user to use ghvis
    Authorize(UserArgs),

    /// Withdraw a user's access
    Revoke(UserArgs),
}

#[derive(Args, Debug)]
pub struct UserArgs {
    /// User id
    pub id: TenantId,
}

pub async fn handle(app: &App, cmd: AdminCommand) -> Result<()> {
    app.require_admin().await?;

    match cmd.command {
        AdminSubcommand::Authorize(args) => set_access(app, args.id, true).await,
        AdminSubcommand::Revoke(args) => set_access(app, args.id, false).await,
    }
}

async fn set_access(app: &App, user: TenantId, authorized: bool) -> Result<()> {
    let action = if authorized { "authorize" } else { "revoke" };

    let updated = app
        .store
        .set_authorized(user, authorized)
        .await
        .context("Failed to update user registry")?;
    app.audit(action, &user.to_string(), updated).await;

    if !updated {
        bail!(
            "User {} is not registered; ask them to run `ghvis start` first",
            user
        );
    }

    if authorized {
        output::success(&format!("User {} authorized", user));
    } else {
        output::success(&format!("Access revoked for user {}", user));
    }
    Ok(())
}
