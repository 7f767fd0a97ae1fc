//! GitHub REST endpoint paths and wire types.

use serde::{Deserialize, Serialize};

use ghvis_core::RepoRef;
use ghvis_core::repo::RepositoryInfo;

/// Media type requested on every call.
pub const ACCEPT: &str = "application/vnd.github+json";

/// Page size for repository listings (GitHub maximum).
pub const PER_PAGE: usize = 100;

/// GET /user
pub const USER: &str = "user";

/// GET /user/repos
pub const USER_REPOS: &str = "user/repos";

/// GET|PATCH /repos/{owner}/{repo}
pub fn repository(repo: &RepoRef) -> String {
    format!("repos/{}/{}", repo.owner(), repo.name())
}

/// Response from GET /user.
#[derive(Debug, Deserialize)]
pub struct UserResponse {
    pub login: String,
}

/// Owner object embedded in repository responses.
#[derive(Debug, Deserialize)]
pub struct OwnerResponse {
    pub login: String,
}

/// Repository object as returned by the repository endpoints.
#[derive(Debug, Deserialize)]
pub struct RepositoryResponse {
    pub name: String,
    pub full_name: String,
    pub owner: OwnerResponse,
    pub private: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl From<RepositoryResponse> for RepositoryInfo {
    fn from(r: RepositoryResponse) -> Self {
        RepositoryInfo {
            name: r.name,
            full_name: r.full_name,
            owner: r.owner.login,
            private: r.private,
            description: r.description,
            html_url: r.html_url,
            language: r.language,
            size: r.size,
            created_at: r.created_at.unwrap_or_default(),
            updated_at: r.updated_at.unwrap_or_default(),
        }
    }
}

/// Request body for PATCH /repos/{owner}/{repo}.
#[derive(Debug, Serialize)]
pub struct UpdateVisibilityRequest {
    pub private: bool,
}

/// Query parameters for GET /user/repos.
#[derive(Debug, Serialize)]
pub struct ListReposQuery {
    pub page: u32,
    pub per_page: usize,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub sort: &'static str,
}

impl ListReposQuery {
    pub fn page(page: u32) -> Self {
        Self {
            page,
            per_page: PER_PAGE,
            kind: "all",
            sort: "updated",
        }
    }
}

/// Error body returned by GitHub on non-success responses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
}
