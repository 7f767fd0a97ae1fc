//! Per-invocation application context.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{debug, warn};

use ghvis_core::error::Error;
use ghvis_core::ratelimit::DEFAULT_WINDOW;
use ghvis_core::{
    AuditEntry, AuditStatus, AuditStore, BatchOrchestrator, Cipher, Credential, RateLimiter,
    TenantId, UserRecord, UserStore, Vault,
};
use ghvis_file::FileStore;
use ghvis_github::GithubClient;

use crate::config::Settings;

/// Everything a command needs: settings, storage, the vault and the acting user.
pub struct App {
    pub settings: Settings,
    pub store: FileStore,
    pub vault: Vault<FileStore>,
    pub limiter: RateLimiter<FileStore>,
    pub tenant: TenantId,
}

impl App {
    /// Build the context for `user`, falling back to the configured default user.
    pub fn new(settings: Settings, user: Option<&str>) -> Result<Self> {
        let tenant = match user {
            Some(id) => id
                .parse::<TenantId>()
                .with_context(|| format!("Invalid user id '{}'", id))?,
            None => settings
                .default_user
                .context("No user given; pass --user <id> or set GHVIS_USER")?,
        };

        let cipher =
            Cipher::from_secret(&settings.encryption_key).context("Invalid encryption key")?;
        let store = FileStore::new(&settings.data_dir);
        let vault = Vault::new(store.clone(), cipher);
        let limiter = RateLimiter::new(
            store.clone(),
            settings.max_requests_per_minute,
            DEFAULT_WINDOW,
        );

        debug!(tenant = %tenant, data_dir = %settings.data_dir.display(), "context ready");

        Ok(Self {
            settings,
            store,
            vault,
            limiter,
            tenant,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.settings.is_admin(self.tenant)
    }

    /// Configured admins, or users an admin has authorized.
    pub async fn is_authorized(&self) -> Result<bool> {
        if self.is_admin() {
            return Ok(true);
        }
        let user = self
            .store
            .get_user(self.tenant)
            .await
            .context("Failed to read user registry")?;
        Ok(user.is_some_and(|u| u.is_authorized))
    }

    /// Fail unless the acting user may run commands. Also applies the rate limit.
    pub async fn require_authorized(&self) -> Result<()> {
        if !self.is_authorized().await? {
            bail!(
                "Access denied: user {} is not authorized. Ask an administrator to run `ghvis admin authorize {}`",
                self.tenant,
                self.tenant
            );
        }
        self.check_rate_limit().await
    }

    /// Fail unless the acting user is a configured admin. Also applies the rate limit.
    pub async fn require_admin(&self) -> Result<()> {
        if !self.is_admin() {
            bail!("Access denied: administrator privileges required");
        }
        self.check_rate_limit().await
    }

    /// Count one request against the acting user's window.
    ///
    /// The window is kept in the data directory, so it spans invocations.
    pub async fn check_rate_limit(&self) -> Result<()> {
        let admitted = self
            .limiter
            .check(self.tenant)
            .await
            .context("Failed to update request history")?;
        if !admitted {
            bail!("Rate limit exceeded; try again in a minute");
        }
        Ok(())
    }

    /// Register the acting user if unknown. Admins are authorized on creation.
    pub async fn register(&self, username: &str) -> Result<UserRecord> {
        self.store
            .upsert_user(UserRecord {
                tenant: self.tenant,
                username: username.to_string(),
                is_authorized: self.is_admin(),
                created_at: Utc::now(),
            })
            .await
            .context("Failed to register user")
    }

    /// The active credential, decrypted.
    ///
    /// An undecryptable credential is an error with its own message, distinct
    /// from having no active credential.
    pub async fn active_credential(&self) -> Result<Option<Credential>> {
        match self.vault.get_active(self.tenant).await {
            Ok(credential) => Ok(credential),
            Err(Error::Decryption(e)) => Err(anyhow::Error::new(e).context(
                "The active credential cannot be decrypted; the encryption key may have changed. Re-add it with `ghvis api add`",
            )),
            Err(e) => Err(e).context("Failed to read the active credential"),
        }
    }

    /// The active credential and a client bound to it.
    pub async fn active_client(&self) -> Result<(Credential, GithubClient)> {
        let Some(credential) = self.active_credential().await? else {
            bail!("No active API credential. Use `ghvis api list` and `ghvis api load <name>` first");
        };

        let client = GithubClient::new(self.settings.api_base.clone(), &credential.token)
            .context("Failed to create GitHub client")?;
        Ok((credential, client))
    }

    pub fn orchestrator(&self) -> BatchOrchestrator {
        BatchOrchestrator::new(self.settings.batch)
    }

    /// Append an audit entry for the acting user.
    ///
    /// A failed audit write is logged and does not fail the command.
    pub async fn audit(&self, action: &str, target: &str, success: bool) {
        let entry = AuditEntry::now(
            self.tenant,
            action,
            target,
            AuditStatus::from_success(success),
        );
        if let Err(e) = self.store.append_audit_entry(entry).await {
            warn!(error = %e, action, target, "failed to write audit entry");
        }
    }
}
