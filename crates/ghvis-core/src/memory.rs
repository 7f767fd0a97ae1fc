//! In-memory implementation of the persistence traits.
//!
//! State lives in maps guarded by a single mutex, so every trait method is
//! one atomic unit. Not durable: all state is lost when the store is dropped.
//! Clones share state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Result;
use crate::error::StorageError;
use crate::ratelimit::admit;
use crate::records::{AuditEntry, RepoStatus, StoredCredential, UserRecord};
use crate::traits::{AuditStore, CredentialStore, RateLimitStore, RepoStatusStore, UserStore};
use crate::types::{CredentialName, RepoRef, TenantId};

#[derive(Debug, Default)]
struct Inner {
    credentials: HashMap<TenantId, Vec<StoredCredential>>,
    repositories: HashMap<(TenantId, RepoRef), RepoStatus>,
    audit: Vec<AuditEntry>,
    users: HashMap<TenantId, UserRecord>,
    requests: HashMap<TenantId, Vec<DateTime<Utc>>>,
    fail_writes: bool,
}

/// Store backed by process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent mutation fail with a storage error.
    ///
    /// Reads keep working. Used to exercise failure paths.
    pub fn fail_writes(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_writes = fail;
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| StorageError::Poisoned.into())
    }

    fn lock_for_write(&self) -> Result<MutexGuard<'_, Inner>> {
        let inner = self.lock()?;
        if inner.fail_writes {
            return Err(StorageError::Io {
                message: "writes disabled".to_string(),
            }
            .into());
        }
        Ok(inner)
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn upsert_credential(&self, record: StoredCredential) -> Result<()> {
        let mut inner = self.lock_for_write()?;
        let rows = inner.credentials.entry(record.tenant).or_default();
        match rows.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => *existing = record,
            None => rows.push(record),
        }
        Ok(())
    }

    async fn list_credentials(&self, tenant: TenantId) -> Result<Vec<StoredCredential>> {
        let inner = self.lock()?;
        let mut rows = inner.credentials.get(&tenant).cloned().unwrap_or_default();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn find_credential(
        &self,
        tenant: TenantId,
        name: &CredentialName,
    ) -> Result<Option<StoredCredential>> {
        let inner = self.lock()?;
        Ok(inner
            .credentials
            .get(&tenant)
            .and_then(|rows| rows.iter().find(|r| &r.name == name))
            .cloned())
    }

    async fn find_active_credential(&self, tenant: TenantId) -> Result<Option<StoredCredential>> {
        let inner = self.lock()?;
        Ok(inner
            .credentials
            .get(&tenant)
            .and_then(|rows| rows.iter().find(|r| r.is_active))
            .cloned())
    }

    async fn activate_exclusive(&self, tenant: TenantId, name: &CredentialName) -> Result<bool> {
        let mut inner = self.lock_for_write()?;
        let Some(rows) = inner.credentials.get_mut(&tenant) else {
            return Ok(false);
        };

        let mut found = false;
        for row in rows.iter_mut() {
            row.is_active = &row.name == name;
            found |= row.is_active;
        }
        Ok(found)
    }

    async fn delete_credential(&self, tenant: TenantId, name: &CredentialName) -> Result<bool> {
        let mut inner = self.lock_for_write()?;
        let Some(rows) = inner.credentials.get_mut(&tenant) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|r| &r.name != name);
        Ok(rows.len() != before)
    }
}

#[async_trait]
impl RepoStatusStore for MemoryStore {
    async fn upsert_repo_status(&self, tenant: TenantId, status: RepoStatus) -> Result<()> {
        let mut inner = self.lock_for_write()?;
        inner
            .repositories
            .insert((tenant, status.repo.clone()), status);
        Ok(())
    }

    async fn get_repo_status(
        &self,
        tenant: TenantId,
        repo: &RepoRef,
    ) -> Result<Option<RepoStatus>> {
        let inner = self.lock()?;
        Ok(inner.repositories.get(&(tenant, repo.clone())).cloned())
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append_audit_entry(&self, entry: AuditEntry) -> Result<()> {
        let mut inner = self.lock_for_write()?;
        inner.audit.push(entry);
        Ok(())
    }

    async fn query_audit_entries(
        &self,
        tenant: TenantId,
        limit: usize,
    ) -> Result<Vec<AuditEntry>> {
        let inner = self.lock()?;
        Ok(inner
            .audit
            .iter()
            .rev()
            .filter(|e| e.tenant == tenant)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn upsert_user(&self, user: UserRecord) -> Result<UserRecord> {
        let mut inner = self.lock_for_write()?;
        Ok(inner.users.entry(user.tenant).or_insert(user).clone())
    }

    async fn get_user(&self, tenant: TenantId) -> Result<Option<UserRecord>> {
        let inner = self.lock()?;
        Ok(inner.users.get(&tenant).cloned())
    }

    async fn set_authorized(&self, tenant: TenantId, authorized: bool) -> Result<bool> {
        let mut inner = self.lock_for_write()?;
        match inner.users.get_mut(&tenant) {
            Some(user) => {
                user.is_authorized = authorized;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl RateLimitStore for MemoryStore {
    async fn admit_request(
        &self,
        tenant: TenantId,
        now: DateTime<Utc>,
        max_requests: usize,
        window: Duration,
    ) -> Result<bool> {
        let mut inner = self.lock_for_write()?;
        let hits = inner.requests.entry(tenant).or_default();
        Ok(admit(hits, now, max_requests, window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::AuditStatus;
    use chrono::{Duration, Utc};

    fn record(tenant: i64, name: &str, active: bool, age_secs: i64) -> StoredCredential {
        StoredCredential {
            tenant: TenantId::new(tenant),
            name: CredentialName::new(name).unwrap(),
            secret_ciphertext: format!("cipher-{}", name),
            remote_principal: "octocat".to_string(),
            is_active: active,
            created_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    #[tokio::test]
    async fn list_is_newest_first_and_tenant_scoped() {
        let store = MemoryStore::new();
        store.upsert_credential(record(1, "old", false, 60)).await.unwrap();
        store.upsert_credential(record(1, "new", false, 0)).await.unwrap();
        store.upsert_credential(record(2, "other", false, 0)).await.unwrap();

        let rows = store.list_credentials(TenantId::new(1)).await.unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["new", "old"]);
    }

    #[tokio::test]
    async fn activate_exclusive_leaves_one_active() {
        let store = MemoryStore::new();
        let tenant = TenantId::new(1);
        store.upsert_credential(record(1, "a", true, 10)).await.unwrap();
        store.upsert_credential(record(1, "b", false, 0)).await.unwrap();

        let b = CredentialName::new("b").unwrap();
        assert!(store.activate_exclusive(tenant, &b).await.unwrap());
        let active = store.find_active_credential(tenant).await.unwrap().unwrap();
        assert_eq!(active.name, b);

        let missing = CredentialName::new("missing").unwrap();
        assert!(!store.activate_exclusive(tenant, &missing).await.unwrap());
        assert!(store.find_active_credential(tenant).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_write_leaves_state_unchanged() {
        let store = MemoryStore::new();
        let tenant = TenantId::new(1);
        store.upsert_credential(record(1, "a", true, 0)).await.unwrap();
        store.upsert_credential(record(1, "b", false, 0)).await.unwrap();

        store.fail_writes(true);
        let b = CredentialName::new("b").unwrap();
        assert!(store.activate_exclusive(tenant, &b).await.is_err());
        store.fail_writes(false);

        let active = store.find_active_credential(tenant).await.unwrap().unwrap();
        assert_eq!(active.name.as_str(), "a");
    }

    #[tokio::test]
    async fn audit_query_is_newest_first_with_limit() {
        let store = MemoryStore::new();
        let tenant = TenantId::new(7);
        for i in 0..5 {
            store
                .append_audit_entry(AuditEntry::now(
                    tenant,
                    "make_private",
                    format!("octocat/repo{}", i),
                    AuditStatus::Success,
                ))
                .await
                .unwrap();
        }

        let entries = store.query_audit_entries(tenant, 2).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].target, "octocat/repo4");
        assert_eq!(entries[1].target, "octocat/repo3");
    }

    #[tokio::test]
    async fn upsert_user_keeps_existing() {
        let store = MemoryStore::new();
        let tenant = TenantId::new(3);
        let user = UserRecord {
            tenant,
            username: "first".to_string(),
            is_authorized: false,
            created_at: Utc::now(),
        };
        store.upsert_user(user.clone()).await.unwrap();
        assert!(store.set_authorized(tenant, true).await.unwrap());

        let again = store
            .upsert_user(UserRecord {
                username: "second".to_string(),
                ..user
            })
            .await
            .unwrap();
        assert_eq!(again.username, "first");
        assert!(again.is_authorized);
        assert!(!store.set_authorized(TenantId::new(4), true).await.unwrap());
    }
}
