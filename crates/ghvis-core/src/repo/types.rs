//! Repository metadata types.

use serde::{Deserialize, Serialize};

use crate::types::{RepoRef, Visibility};

/// Repository metadata as reported by the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    /// Repository name without the owner.
    pub name: String,

    /// `owner/name` as reported by the remote.
    pub full_name: String,

    /// Owner login.
    pub owner: String,

    /// Whether the repository is currently private.
    pub private: bool,

    #[serde(default)]
    pub description: Option<String>,

    /// Web URL of the repository.
    pub html_url: String,

    #[serde(default)]
    pub language: Option<String>,

    /// Size in kilobytes.
    #[serde(default)]
    pub size: u64,

    /// RFC 3339 timestamps, kept as reported.
    pub created_at: String,
    pub updated_at: String,
}

impl RepositoryInfo {
    /// Current visibility.
    pub fn visibility(&self) -> Visibility {
        Visibility::from_private(self.private)
    }

    /// Reference to this repository, if the reported names are valid.
    pub fn repo_ref(&self) -> Option<RepoRef> {
        RepoRef::from_parts(&self.owner, &self.name).ok()
    }

    /// Size in megabytes, rounded to two decimals.
    pub fn size_mb(&self) -> f64 {
        (self.size as f64 / 1024.0 * 100.0).round() / 100.0
    }
}
