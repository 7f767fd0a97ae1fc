//! Start command: registration and status.

use anyhow::{Context, Result};

use ghvis_core::AuditStore;

use crate::context::App;
use crate::output;

pub async fn run(app: &App) -> Result<()> {
    app.check_rate_limit().await?;

    let username = format!("user_{}", app.tenant);
    let user = app.register(&username).await?;

    if !app.is_authorized().await? {
        output::heading(&format!("Hello, {}!", user.username));
        println!("You have been registered but are not yet authorized.");
        println!();
        output::field("User ID", &app.tenant.to_string());
        output::field("Status", "Pending authorization");
        println!();
        output::hint("Share your user ID with an administrator to get access.");
        return Ok(());
    }

    output::heading(&format!("Welcome back, {}!", user.username));
    if app.is_admin() {
        output::field("Role", "administrator");
    }

    let credentials = app
        .vault
        .list(app.tenant)
        .await
        .context("Failed to list credentials")?;
    let recent = app
        .store
        .query_audit_entries(app.tenant, 5)
        .await
        .context("Failed to read activity log")?;

    match credentials.iter().find(|c| c.is_active) {
        Some(active) => output::field(
            "Credentials",
            &format!("{} (active: {})", credentials.len(), active.name),
        ),
        None if credentials.is_empty() => output::field("Credentials", "none yet"),
        None => output::field("Credentials", &format!("{} (none active)", credentials.len())),
    }
    output::field("Recent actions", &recent.len().to_string());

    println!();
    if credentials.is_empty() {
        output::hint("Start with `ghvis api add <name> <token>`.");
    } else if !credentials.iter().any(|c| c.is_active) {
        output::hint("Use `ghvis api load <name>` to activate a credential.");
    }

    Ok(())
}
