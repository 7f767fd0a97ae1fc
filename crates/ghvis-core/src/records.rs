//! Persisted record types.
//!
//! These are the row shapes exchanged with the persistence collaborator.
//! Field names follow the tenant-scoped tables: users, named credentials,
//! repository-status cache and audit log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::secret::BearerToken;
use crate::types::{CredentialName, RepoRef, TenantId, Visibility};

/// A credential as stored: the secret is only present as ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    /// Owning tenant.
    pub tenant: TenantId,

    /// Name, unique within the tenant.
    pub name: CredentialName,

    /// Encrypted bearer token.
    pub secret_ciphertext: String,

    /// Login reported by the remote when the token was validated.
    pub remote_principal: String,

    /// Whether this is the tenant's active credential.
    pub is_active: bool,

    /// When the record was created (or last re-added).
    pub created_at: DateTime<Utc>,
}

impl StoredCredential {
    /// Metadata view of this record, without the ciphertext.
    pub fn info(&self) -> CredentialInfo {
        CredentialInfo {
            name: self.name.clone(),
            remote_principal: self.remote_principal.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

/// Credential metadata. Listing never decrypts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialInfo {
    pub name: CredentialName,
    pub remote_principal: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A credential with its decrypted secret.
#[derive(Debug, Clone)]
pub struct Credential {
    pub name: CredentialName,
    pub remote_principal: String,
    pub token: BearerToken,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Last known visibility of a repository, per tenant.
///
/// Purely a cache; the remote service is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoStatus {
    pub repo: RepoRef,
    pub visibility: Visibility,
    pub last_modified: DateTime<Utc>,
}

/// Outcome recorded in an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    Failed,
}

impl AuditStatus {
    pub fn from_success(success: bool) -> Self {
        if success {
            AuditStatus::Success
        } else {
            AuditStatus::Failed
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, AuditStatus::Success)
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuditStatus::Success => "success",
            AuditStatus::Failed => "failed",
        })
    }
}

/// One entry of a tenant's activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub tenant: TenantId,

    /// Action name, e.g. `add_api`, `make_private`, `batch_toggle`.
    pub action: String,

    /// What the action touched: `owner/name`, a credential name or a user id.
    pub target: String,

    pub status: AuditStatus,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Create an entry stamped with the current time.
    pub fn now(
        tenant: TenantId,
        action: impl Into<String>,
        target: impl Into<String>,
        status: AuditStatus,
    ) -> Self {
        Self {
            tenant,
            action: action.into(),
            target: target.into(),
            status,
            timestamp: Utc::now(),
        }
    }
}

/// A known operator and whether they may use ghvis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub tenant: TenantId,
    pub username: String,
    pub is_authorized: bool,
    pub created_at: DateTime<Utc>,
}
