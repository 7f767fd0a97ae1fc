//! Filesystem storage for ghvis.
//!
//! Layout below the root directory:
//!
//! ```text
//! users.json                      known operators
//! users.lock
//! tenants/<id>/credentials.json   encrypted credentials
//! tenants/<id>/repositories.json  last known visibility
//! tenants/<id>/audit.jsonl        activity log, one entry per line
//! tenants/<id>/ratelimit.json     recent request timestamps
//! tenants/<id>/tenant.lock
//! ```
//!
//! Every trait method takes the relevant advisory lock (shared for reads,
//! exclusive for writes) for its whole read-modify-write cycle. JSON files are
//! replaced by writing a temporary file and renaming it over the original, so
//! a failed write leaves the previous content in place.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use ghvis_core::Result;
use ghvis_core::error::{Error, StorageError};
use ghvis_core::ratelimit::admit;
use ghvis_core::records::{AuditEntry, RepoStatus, StoredCredential, UserRecord};
use ghvis_core::traits::{
    AuditStore, CredentialStore, RateLimitStore, RepoStatusStore, UserStore,
};
use ghvis_core::types::{CredentialName, RepoRef, TenantId};

fn map_io(err: std::io::Error) -> Error {
    Error::Storage(err.into())
}

fn corrupt(path: &Path, err: serde_json::Error) -> Error {
    Error::Storage(StorageError::Corrupt {
        location: path.display().to_string(),
        message: err.to_string(),
    })
}

#[derive(Debug, Clone, Copy)]
enum LockMode {
    Shared,
    Exclusive,
}

/// Filesystem-backed implementation of the persistence traits.
///
/// Several processes may share one root; the advisory locks serialize them.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a new file store at the given root directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn users_path(&self) -> PathBuf {
        self.root.join("users.json")
    }

    fn users_lock_path(&self) -> PathBuf {
        self.root.join("users.lock")
    }

    fn tenant_dir(&self, tenant: TenantId) -> PathBuf {
        self.root.join("tenants").join(tenant.to_string())
    }

    fn credentials_path(&self, tenant: TenantId) -> PathBuf {
        self.tenant_dir(tenant).join("credentials.json")
    }

    fn repositories_path(&self, tenant: TenantId) -> PathBuf {
        self.tenant_dir(tenant).join("repositories.json")
    }

    fn audit_path(&self, tenant: TenantId) -> PathBuf {
        self.tenant_dir(tenant).join("audit.jsonl")
    }

    fn ratelimit_path(&self, tenant: TenantId) -> PathBuf {
        self.tenant_dir(tenant).join("ratelimit.json")
    }

    fn tenant_lock_path(&self, tenant: TenantId) -> PathBuf {
        self.tenant_dir(tenant).join("tenant.lock")
    }

    /// Run `f` while holding the lock file at `lock_path`.
    fn with_lock<T>(
        &self,
        lock_path: &Path,
        mode: LockMode,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(map_io)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(lock_path)
            .map_err(map_io)?;

        match mode {
            LockMode::Shared => FileExt::lock_shared(&lock_file),
            LockMode::Exclusive => FileExt::lock_exclusive(&lock_file),
        }
        .map_err(map_io)?;

        let result = f();
        FileExt::unlock(&lock_file).map_err(map_io)?;
        result
    }

    fn with_tenant<T>(
        &self,
        tenant: TenantId,
        mode: LockMode,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        self.with_lock(&self.tenant_lock_path(tenant), mode, f)
    }

    fn with_users<T>(&self, mode: LockMode, f: impl FnOnce() -> Result<T>) -> Result<T> {
        self.with_lock(&self.users_lock_path(), mode, f)
    }
}

/// Read a JSON file, or the default value if it does not exist.
fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = fs::read_to_string(path).map_err(map_io)?;
    serde_json::from_str(&content).map_err(|e| corrupt(path, e))
}

/// Replace a JSON file atomically.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(map_io)?;
    }

    let content = serde_json::to_string_pretty(value).map_err(|e| corrupt(path, e))?;
    let temp_path = path.with_extension("json.tmp");

    let mut file = File::create(&temp_path).map_err(map_io)?;
    file.write_all(content.as_bytes()).map_err(map_io)?;
    file.sync_data().map_err(map_io)?;
    fs::rename(&temp_path, path).map_err(map_io)?;

    Ok(())
}

fn deactivate_all(rows: &mut [StoredCredential]) {
    for row in rows.iter_mut() {
        row.is_active = false;
    }
}

fn activate_by_name(rows: &mut [StoredCredential], name: &CredentialName) -> bool {
    match rows.iter_mut().find(|r| &r.name == name) {
        Some(row) => {
            row.is_active = true;
            true
        }
        None => false,
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    #[instrument(skip(self, record), fields(tenant = %record.tenant, name = %record.name))]
    async fn upsert_credential(&self, record: StoredCredential) -> Result<()> {
        let tenant = record.tenant;
        let path = self.credentials_path(tenant);

        self.with_tenant(tenant, LockMode::Exclusive, || {
            let mut rows: Vec<StoredCredential> = read_json(&path)?;
            match rows.iter_mut().find(|r| r.name == record.name) {
                Some(existing) => *existing = record,
                None => rows.push(record),
            }
            write_json(&path, &rows)
        })?;

        debug!("credential written");
        Ok(())
    }

    async fn list_credentials(&self, tenant: TenantId) -> Result<Vec<StoredCredential>> {
        let path = self.credentials_path(tenant);
        let mut rows: Vec<StoredCredential> =
            self.with_tenant(tenant, LockMode::Shared, || read_json(&path))?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn find_credential(
        &self,
        tenant: TenantId,
        name: &CredentialName,
    ) -> Result<Option<StoredCredential>> {
        let path = self.credentials_path(tenant);
        let rows: Vec<StoredCredential> =
            self.with_tenant(tenant, LockMode::Shared, || read_json(&path))?;
        Ok(rows.into_iter().find(|r| &r.name == name))
    }

    async fn find_active_credential(&self, tenant: TenantId) -> Result<Option<StoredCredential>> {
        let path = self.credentials_path(tenant);
        let rows: Vec<StoredCredential> =
            self.with_tenant(tenant, LockMode::Shared, || read_json(&path))?;
        Ok(rows.into_iter().find(|r| r.is_active))
    }

    #[instrument(skip(self), fields(tenant = %tenant, name = %name))]
    async fn activate_exclusive(&self, tenant: TenantId, name: &CredentialName) -> Result<bool> {
        let path = self.credentials_path(tenant);

        let found = self.with_tenant(tenant, LockMode::Exclusive, || {
            let mut rows: Vec<StoredCredential> = read_json(&path)?;
            deactivate_all(&mut rows);
            let found = activate_by_name(&mut rows, name);
            write_json(&path, &rows)?;
            Ok(found)
        })?;

        debug!(found, "active credential updated");
        Ok(found)
    }

    #[instrument(skip(self), fields(tenant = %tenant, name = %name))]
    async fn delete_credential(&self, tenant: TenantId, name: &CredentialName) -> Result<bool> {
        let path = self.credentials_path(tenant);

        self.with_tenant(tenant, LockMode::Exclusive, || {
            let mut rows: Vec<StoredCredential> = read_json(&path)?;
            let before = rows.len();
            rows.retain(|r| &r.name != name);
            if rows.len() == before {
                return Ok(false);
            }
            write_json(&path, &rows)?;
            Ok(true)
        })
    }
}

#[async_trait]
impl RepoStatusStore for FileStore {
    async fn upsert_repo_status(&self, tenant: TenantId, status: RepoStatus) -> Result<()> {
        let path = self.repositories_path(tenant);

        self.with_tenant(tenant, LockMode::Exclusive, || {
            let mut rows: Vec<RepoStatus> = read_json(&path)?;
            match rows.iter_mut().find(|r| r.repo == status.repo) {
                Some(existing) => *existing = status,
                None => rows.push(status),
            }
            write_json(&path, &rows)
        })
    }

    async fn get_repo_status(
        &self,
        tenant: TenantId,
        repo: &RepoRef,
    ) -> Result<Option<RepoStatus>> {
        let path = self.repositories_path(tenant);
        let rows: Vec<RepoStatus> =
            self.with_tenant(tenant, LockMode::Shared, || read_json(&path))?;
        Ok(rows.into_iter().find(|r| &r.repo == repo))
    }
}

#[async_trait]
impl AuditStore for FileStore {
    async fn append_audit_entry(&self, entry: AuditEntry) -> Result<()> {
        let path = self.audit_path(entry.tenant);

        self.with_tenant(entry.tenant, LockMode::Exclusive, || {
            let line = serde_json::to_string(&entry).map_err(|e| corrupt(&path, e))?;
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(map_io)?;
            writeln!(file, "{}", line).map_err(map_io)?;
            file.sync_data().map_err(map_io)
        })
    }

    async fn query_audit_entries(
        &self,
        tenant: TenantId,
        limit: usize,
    ) -> Result<Vec<AuditEntry>> {
        let path = self.audit_path(tenant);

        let mut entries = self.with_tenant(tenant, LockMode::Shared, || {
            if !path.exists() {
                return Ok(Vec::new());
            }
            let file = File::open(&path).map_err(map_io)?;
            let mut entries = Vec::new();
            for line in BufReader::new(file).lines() {
                let line = line.map_err(map_io)?;
                if line.trim().is_empty() {
                    continue;
                }
                let entry: AuditEntry =
                    serde_json::from_str(&line).map_err(|e| corrupt(&path, e))?;
                entries.push(entry);
            }
            Ok(entries)
        })?;

        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }
}

#[async_trait]
impl UserStore for FileStore {
    async fn upsert_user(&self, user: UserRecord) -> Result<UserRecord> {
        let path = self.users_path();

        self.with_users(LockMode::Exclusive, || {
            let mut users: Vec<UserRecord> = read_json(&path)?;
            if let Some(existing) = users.iter().find(|u| u.tenant == user.tenant) {
                return Ok(existing.clone());
            }
            users.push(user.clone());
            write_json(&path, &users)?;
            Ok(user)
        })
    }

    async fn get_user(&self, tenant: TenantId) -> Result<Option<UserRecord>> {
        let path = self.users_path();
        let users: Vec<UserRecord> = self.with_users(LockMode::Shared, || read_json(&path))?;
        Ok(users.into_iter().find(|u| u.tenant == tenant))
    }

    #[instrument(skip(self))]
    async fn set_authorized(&self, tenant: TenantId, authorized: bool) -> Result<bool> {
        let path = self.users_path();

        self.with_users(LockMode::Exclusive, || {
            let mut users: Vec<UserRecord> = read_json(&path)?;
            let Some(user) = users.iter_mut().find(|u| u.tenant == tenant) else {
                return Ok(false);
            };
            user.is_authorized = authorized;
            write_json(&path, &users)?;
            Ok(true)
        })
    }
}

#[async_trait]
impl RateLimitStore for FileStore {
    async fn admit_request(
        &self,
        tenant: TenantId,
        now: DateTime<Utc>,
        max_requests: usize,
        window: Duration,
    ) -> Result<bool> {
        let path = self.ratelimit_path(tenant);

        self.with_tenant(tenant, LockMode::Exclusive, || {
            let mut hits: Vec<DateTime<Utc>> = read_json(&path)?;
            let admitted = admit(&mut hits, now, max_requests, window);
            if admitted {
                write_json(&path, &hits)?;
            }
            Ok(admitted)
        })
    }
}
