//! Persistence collaborator traits.
//!
//! Each method is a single atomic unit of work against a tenant-scoped
//! row set. Implementations decide the schema.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Result;
use crate::records::{AuditEntry, RepoStatus, StoredCredential, UserRecord};
use crate::types::{CredentialName, RepoRef, TenantId};

/// Storage for named, encrypted credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a credential, or replace the record with the same tenant and name.
    ///
    /// The record is written as given, including its `is_active` flag.
    async fn upsert_credential(&self, record: StoredCredential) -> Result<()>;

    /// All credentials of a tenant, newest first.
    async fn list_credentials(&self, tenant: TenantId) -> Result<Vec<StoredCredential>>;

    /// The credential with the given name, if any.
    async fn find_credential(
        &self,
        tenant: TenantId,
        name: &CredentialName,
    ) -> Result<Option<StoredCredential>>;

    /// The tenant's active credential, if any.
    async fn find_active_credential(&self, tenant: TenantId) -> Result<Option<StoredCredential>>;

    /// Deactivate all of the tenant's credentials, then activate `name`.
    ///
    /// Both steps form one unit: concurrent callers for the same tenant are
    /// serialized, and on failure neither step is visible. Returns false if
    /// `name` does not exist, in which case the tenant is left with no active
    /// credential.
    async fn activate_exclusive(&self, tenant: TenantId, name: &CredentialName) -> Result<bool>;

    /// Delete a credential. Returns true if a record was removed.
    async fn delete_credential(&self, tenant: TenantId, name: &CredentialName) -> Result<bool>;
}

/// Cache of last known repository visibility.
#[async_trait]
pub trait RepoStatusStore: Send + Sync {
    async fn upsert_repo_status(&self, tenant: TenantId, status: RepoStatus) -> Result<()>;

    async fn get_repo_status(
        &self,
        tenant: TenantId,
        repo: &RepoRef,
    ) -> Result<Option<RepoStatus>>;
}

/// Append-only activity log.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append_audit_entry(&self, entry: AuditEntry) -> Result<()>;

    /// The tenant's most recent entries, newest first.
    async fn query_audit_entries(
        &self,
        tenant: TenantId,
        limit: usize,
    ) -> Result<Vec<AuditEntry>>;
}

/// Registry of known operators and their authorization.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user if absent. Existing users are left untouched.
    ///
    /// Returns the stored record.
    async fn upsert_user(&self, user: UserRecord) -> Result<UserRecord>;

    async fn get_user(&self, tenant: TenantId) -> Result<Option<UserRecord>>;

    /// Set the authorization flag. Returns false if the user is unknown.
    async fn set_authorized(&self, tenant: TenantId, authorized: bool) -> Result<bool>;
}

/// Recent request timestamps per tenant, for rate limiting.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Record a request at `now` unless the tenant already made
    /// `max_requests` requests within `window` before it.
    ///
    /// The check and the record form one unit. Returns whether the request
    /// was admitted.
    async fn admit_request(
        &self,
        tenant: TenantId,
        now: DateTime<Utc>,
        max_requests: usize,
        window: Duration,
    ) -> Result<bool>;
}
